//! The UI handles a chat client is built from.
//!
//! A host provides a [`LogView`] (where messages are drawn), an
//! [`InputField`] (where the user types), and feeds [`UiEvent`]s from its
//! send trigger into the client.

use crate::message::{EntryId, Message};

/// A container that displays the conversation log.
pub trait LogView {
    /// Draw `message` after every existing entry and return its handle.
    fn append(&mut self, message: Message) -> EntryId;

    /// Remove the entry with the given handle.
    ///
    /// Returns false if no such entry is shown.
    fn remove(&mut self, id: EntryId) -> bool;

    /// Bring the latest entry into view.
    fn scroll_to_end(&mut self) {}

    /// Remove every entry.
    fn clear(&mut self);
}

/// A single-line text input.
pub trait InputField {
    /// The current contents, untrimmed.
    fn value(&self) -> String;

    /// Empty the field.
    fn clear(&mut self);
}

/// Keys a host may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// The return key.
    Enter,
    /// A printable character.
    Char(char),
    /// Anything else.
    Other,
}

/// An event from the host's input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// The send button was activated.
    Click,
    /// A key was pressed while the input field had focus.
    KeyPress(Key),
}

impl UiEvent {
    /// True for events that submit the input: a click or the Enter key.
    pub fn triggers_send(&self) -> bool {
        matches!(self, UiEvent::Click | UiEvent::KeyPress(Key::Enter))
    }
}

/// A plain in-memory [`InputField`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
}

impl TextInput {
    /// Create an empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents, as if the user had typed `value`.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }
}

impl InputField for TextInput {
    fn value(&self) -> String {
        self.value.clone()
    }

    fn clear(&mut self) {
        self.value.clear();
    }
}
