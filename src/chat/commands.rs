//! Slash command parsing for the chat application.
//!
//! Lines that start with `/` control the session and are never sent to the
//! backend.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the conversation log.
    Clear,

    /// Draw the whole conversation log again.
    History,

    /// Set the request timeout in seconds.
    Timeout(u64),

    /// Remove the request timeout.
    ClearTimeout,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics.
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a question.
///
/// # Examples
///
/// ```
/// # use chatdesk::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/timeout 30").is_some());
/// assert!(parse_command("What is a hash?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "history" => ChatCommand::History,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        "timeout" => match argument {
            Some(arg) if arg.eq_ignore_ascii_case("clear") => ChatCommand::ClearTimeout,
            Some(arg) => match arg.parse::<u64>() {
                Ok(0) => ChatCommand::ClearTimeout,
                Ok(secs) => ChatCommand::Timeout(secs),
                Err(_) => {
                    ChatCommand::Invalid("/timeout expects a whole number of seconds".to_string())
                }
            },
            None => ChatCommand::Invalid("/timeout requires a value".to_string()),
        },
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /clear                 Clear the conversation log
  /history               Show the whole conversation again
  /timeout <secs>        Set the request timeout (or 'clear' to wait forever)
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat
Press Ctrl+C while waiting to cancel pending requests."#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_clear_and_history() {
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/CLEAR"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
    }

    #[test]
    fn parse_timeout() {
        assert_eq!(parse_command("/timeout 30"), Some(ChatCommand::Timeout(30)));
        assert_eq!(
            parse_command("/timeout clear"),
            Some(ChatCommand::ClearTimeout)
        );
        assert_eq!(parse_command("/timeout 0"), Some(ChatCommand::ClearTimeout));
        assert!(matches!(
            parse_command("/timeout"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
        assert!(matches!(
            parse_command("/timeout soon"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("expects")
        ));
    }

    #[test]
    fn parse_stats_and_config() {
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/config"), Some(ChatCommand::ShowConfig));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/model gpt"),
            Some(ChatCommand::Invalid("Unknown command: /model".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("What is proof of stake?"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/clear"));
        assert!(help.contains("/timeout"));
    }
}
