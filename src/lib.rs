//! A chat client for question-answering backends.
//!
//! [`ChatClient`] appends the user's text to a conversation log, posts it to
//! a backend's `/chat` endpoint, and renders the answer with its source and
//! confidence.  The UI is injected: any [`InputField`] and [`LogView`] will
//! do, and [`Backend`] abstracts the network.

// Public modules
pub mod backend;
pub mod chat;
pub mod client;
pub mod error;
pub mod history;
pub mod message;
pub mod observability;
pub mod render;
pub mod view;
pub mod wire;

// Re-exports
pub use backend::{Backend, HttpBackend};
pub use client::{ChatClient, RequestId, Resolution, ResponsePolicy, SendPolicy, SessionStats};
pub use error::{Error, Result};
pub use history::ConversationLog;
pub use message::{EntryId, Message, Meta, Sender};
pub use observability::register_biometrics;
pub use render::TerminalView;
pub use view::{InputField, Key, LogView, TextInput, UiEvent};
pub use wire::{ChatReply, ChatRequest};
