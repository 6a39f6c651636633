//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::backend::DEFAULT_BASE_URL;
use crate::client::{DEFAULT_TIMEOUT, ResponsePolicy, SendPolicy};

/// Command-line arguments for the chatdesk tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the backend.
    #[arrrg(optional, "Backend base URL (default: http://localhost:5000)", "URL")]
    pub url: Option<String>,

    /// Per-request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds, 0 to wait forever (default: 60)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Refuse to send while a request is pending.
    #[arrrg(flag, "Allow only one request in flight")]
    pub single_flight: bool,

    /// Validate reply fields before rendering.
    #[arrrg(flag, "Reject replies without well-typed answer/source/confidence")]
    pub strict: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Base URL the `/chat` path is resolved against.
    pub base_url: String,

    /// Bound on each request; `None` waits forever.
    pub timeout: Option<Duration>,

    /// Whether requests may overlap.
    pub send_policy: SendPolicy,

    /// How replies are checked before rendering.
    pub response_policy: ResponsePolicy,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - URL: http://localhost:5000
    /// - Timeout: 60 seconds
    /// - Concurrent sends, lenient replies
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
            send_policy: SendPolicy::Concurrent,
            response_policy: ResponsePolicy::Lenient,
            use_color: true,
        }
    }

    /// Sets the backend base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the send policy.
    pub fn with_send_policy(mut self, policy: SendPolicy) -> Self {
        self.send_policy = policy;
        self
    }

    /// Sets the response policy.
    pub fn with_response_policy(mut self, policy: ResponsePolicy) -> Self {
        self.response_policy = policy;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let timeout = match args.timeout_secs {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_TIMEOUT),
        };
        let send_policy = if args.single_flight {
            SendPolicy::SingleFlight
        } else {
            SendPolicy::Concurrent
        };
        let response_policy = if args.strict {
            ResponsePolicy::Strict
        } else {
            ResponsePolicy::Lenient
        };

        ChatConfig {
            base_url: args.url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout,
            send_policy,
            response_policy,
            use_color: !args.no_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.send_policy, SendPolicy::Concurrent);
        assert_eq!(config.response_policy, ResponsePolicy::Lenient);
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from(ChatArgs::default());
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            url: Some("http://10.0.0.2:8000".to_string()),
            timeout_secs: Some(5),
            single_flight: true,
            strict: true,
            no_color: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(config.base_url, "http://10.0.0.2:8000");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.send_policy, SendPolicy::SingleFlight);
        assert_eq!(config.response_policy, ResponsePolicy::Strict);
        assert!(!config.use_color);
    }

    #[test]
    fn zero_timeout_waits_forever() {
        let args = ChatArgs {
            timeout_secs: Some(0),
            ..ChatArgs::default()
        };
        assert_eq!(ChatConfig::from(args).timeout, None);
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_base_url("https://kb.example.com")
            .with_timeout(None)
            .with_send_policy(SendPolicy::SingleFlight)
            .with_response_policy(ResponsePolicy::Strict)
            .without_color();

        assert_eq!(config.base_url, "https://kb.example.com");
        assert_eq!(config.timeout, None);
        assert_eq!(config.send_policy, SendPolicy::SingleFlight);
        assert_eq!(config.response_policy, ResponsePolicy::Strict);
        assert!(!config.use_color);
    }
}
