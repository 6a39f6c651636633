//! Conversation entries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed text of the placeholder shown while a request is in flight.
pub const THINKING: &str = "Thinking...";

/// Who produced a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Typed by the person at the keyboard.
    User,
    /// Produced by the client on behalf of the backend.
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

/// Provenance of an answer.  Both fields are shown exactly as received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Meta {
    /// Where the answer came from.
    pub source: String,
    /// How sure the backend is, as it reported it.
    pub confidence: String,
}

impl Meta {
    /// Create new metadata.
    pub fn new(source: impl Into<String>, confidence: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            confidence: confidence.into(),
        }
    }
}

/// One rendered conversational entry.
///
/// Messages are never mutated once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// The text body.
    pub text: String,
    /// Who sent it.
    pub sender: Sender,
    /// Optional answer metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Message {
    /// Create a message from the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            meta: None,
        }
    }

    /// Create a bot message without metadata.
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
            meta: None,
        }
    }

    /// Create a bot message carrying answer metadata.
    pub fn answer(text: impl Into<String>, meta: Meta) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
            meta: Some(meta),
        }
    }

    /// The placeholder shown while waiting on the backend.
    pub fn thinking() -> Self {
        Self::bot(THINKING)
    }

    /// The metadata line for this message, if one should be rendered.
    ///
    /// Only bot messages render metadata.
    pub fn meta_line(&self) -> Option<String> {
        match (&self.meta, self.sender) {
            (Some(meta), Sender::Bot) => Some(format!(
                "Source: {} | Confidence: {}",
                meta.source, meta.confidence
            )),
            _ => None,
        }
    }
}

/// Handle for one entry in a log view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl EntryId {
    /// Wrap a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry-{}", self.0)
    }
}
