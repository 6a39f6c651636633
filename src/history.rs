//! The in-memory conversation log.
//!
//! [`ConversationLog`] is the append-only record of what is on screen.  It is
//! a [`LogView`] in its own right, which makes it the natural view for
//! headless use and tests, and it backs the terminal view.

use crate::message::{EntryId, Message, Sender, THINKING};
use crate::view::LogView;

/// Ordered, append-only sequence of messages.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    entries: Vec<(EntryId, Message)>,
    next_id: u64,
    scrolled_to: Option<EntryId>,
}

impl ConversationLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently shown.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is shown.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries top to bottom.
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &Message)> {
        self.entries.iter().map(|(id, message)| (*id, message))
    }

    /// The messages, top to bottom.
    pub fn messages(&self) -> Vec<&Message> {
        self.entries.iter().map(|(_, message)| message).collect()
    }

    /// Look up an entry.
    pub fn get(&self, id: EntryId) -> Option<&Message> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == id)
            .map(|(_, message)| message)
    }

    /// True if the entry is still shown.
    pub fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    /// The bottom entry.
    pub fn last(&self) -> Option<(EntryId, &Message)> {
        self.entries.last().map(|(id, message)| (*id, message))
    }

    /// The entry the view was last scrolled to.
    pub fn scrolled_to(&self) -> Option<EntryId> {
        self.scrolled_to
    }

    /// Number of bot entries showing the placeholder text.
    pub fn placeholder_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, m)| m.sender == Sender::Bot && m.meta.is_none() && m.text == THINKING)
            .count()
    }
}

impl LogView for ConversationLog {
    fn append(&mut self, message: Message) -> EntryId {
        let id = EntryId::new(self.next_id);
        self.next_id += 1;
        self.entries.push((id, message));
        id
    }

    fn remove(&mut self, id: EntryId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        if self.scrolled_to == Some(id) {
            self.scrolled_to = self.entries.last().map(|(entry, _)| *entry);
        }
        self.entries.len() != before
    }

    fn scroll_to_end(&mut self) {
        self.scrolled_to = self.entries.last().map(|(id, _)| *id);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.scrolled_to = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_order() {
        let mut log = ConversationLog::new();
        let a = log.append(Message::user("one"));
        let b = log.append(Message::bot("two"));
        assert_ne!(a, b);
        let texts: Vec<_> = log.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut log = ConversationLog::new();
        let id = log.append(Message::thinking());
        assert_eq!(log.placeholder_count(), 1);
        assert!(log.remove(id));
        assert!(!log.remove(id));
        assert!(log.is_empty());
        assert_eq!(log.placeholder_count(), 0);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut log = ConversationLog::new();
        let first = log.append(Message::user("a"));
        log.remove(first);
        let second = log.append(Message::user("b"));
        assert_ne!(first, second);
        log.clear();
        let third = log.append(Message::user("c"));
        assert!(third > second);
    }

    #[test]
    fn scroll_tracks_latest() {
        let mut log = ConversationLog::new();
        assert_eq!(log.scrolled_to(), None);
        log.append(Message::user("a"));
        let b = log.append(Message::bot("b"));
        log.scroll_to_end();
        assert_eq!(log.scrolled_to(), Some(b));
        log.remove(b);
        assert_eq!(log.scrolled_to(), log.last().map(|(id, _)| id));
    }
}
