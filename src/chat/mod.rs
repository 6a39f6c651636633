//! Interactive terminal front end.
//!
//! The `chatdesk` binary is a host for [`ChatClient`](crate::ChatClient): a
//! line editor stands in for the input field and send trigger, and a
//! [`TerminalView`] stands in for the log container.
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: Slash command parsing

mod commands;
mod config;

pub use crate::render::TerminalView;
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
