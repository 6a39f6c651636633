//! Interactive chat with a question-answering backend.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a backend on http://localhost:5000
//! chatdesk
//!
//! # Point at another backend and give up on slow replies after 10 seconds
//! chatdesk --url http://10.0.0.2:8000 --timeout-secs 10
//!
//! # Disable colors (useful for piping output)
//! chatdesk --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Clear the conversation log
//! - `/history` - Show the conversation again
//! - `/timeout <secs>` - Change the request timeout
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use chatdesk::chat::{ChatArgs, ChatCommand, ChatConfig, TerminalView, help_text, parse_command};
use chatdesk::{ChatClient, HttpBackend, Key, TextInput, UiEvent};

type Client = ChatClient<TextInput, TerminalView>;

/// How often to check for Ctrl+C while waiting on the backend.
const INTERRUPT_POLL: Duration = Duration::from_millis(100);

/// Main entry point for the chatdesk application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let (args, _) = ChatArgs::from_command_line_relaxed("chatdesk [OPTIONS]");
    let config = ChatConfig::from(args);

    let backend = HttpBackend::new(&config.base_url)?;
    let endpoint = backend.endpoint().clone();
    // The line editor already shows what the user typed.
    let view = TerminalView::with_color(config.use_color).with_user_echo(false);
    let mut client = ChatClient::new(TextInput::new(), view, Arc::new(backend))
        .with_send_policy(config.send_policy)
        .with_response_policy(config.response_policy)
        .with_timeout(config.timeout);
    let mut rl = DefaultEditor::new()?;

    // Flag for interrupt handling while waiting on replies
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!("chatdesk (backend: {endpoint})");
    println!("Type /help for commands, /quit to exit\n");

    loop {
        interrupted.store(false, Ordering::Relaxed);

        match rl.readline("You: ") {
            Ok(line) => {
                if let Some(cmd) = parse_command(&line) {
                    let _ = rl.add_history_entry(line.trim());
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            client.clear();
                            client.view_mut().print_info("Conversation cleared.")?;
                        }
                        ChatCommand::History => {
                            if client.view().log().is_empty() {
                                client.view_mut().print_info("(no messages)")?;
                            } else {
                                client.view_mut().redraw()?;
                            }
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                client.view_mut().print_info(&format!("    {line}"))?;
                            }
                        }
                        ChatCommand::Timeout(secs) => {
                            client.set_timeout(Some(Duration::from_secs(secs)));
                            client
                                .view_mut()
                                .print_info(&format!("Timeout set to {secs} seconds."))?;
                        }
                        ChatCommand::ClearTimeout => {
                            client.set_timeout(None);
                            client.view_mut().print_info("Timeout disabled.")?;
                        }
                        ChatCommand::Stats => print_stats(&mut client)?,
                        ChatCommand::ShowConfig => print_config(&mut client, &config)?,
                        ChatCommand::Invalid(message) => {
                            client.view_mut().print_error(&message)?;
                        }
                    }
                    continue;
                }

                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.trim());
                }
                client.input_mut().set_value(line);
                if client.handle_event(UiEvent::KeyPress(Key::Enter)).is_none()
                    && !client.is_send_enabled()
                {
                    client
                        .view_mut()
                        .print_info("A request is still pending; wait for it to finish.")?;
                }
                wait_for_replies(&mut client, &interrupted).await;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                client.view_mut().print_error(&format!("Input error: {err}"))?;
                break;
            }
        }
    }

    client.cancel_pending();
    Ok(())
}

/// Apply replies as they arrive until nothing is pending.
///
/// Ctrl+C cancels every pending request.
async fn wait_for_replies(client: &mut Client, interrupted: &AtomicBool) {
    while client.pending_count() > 0 {
        let cancel = tokio::select! {
            _ = client.next_completion() => false,
            _ = tokio::time::sleep(INTERRUPT_POLL) => interrupted.swap(false, Ordering::Relaxed),
        };
        if cancel {
            client.cancel_pending();
        }
    }
}

fn print_stats(client: &mut Client) -> chatdesk::Result<()> {
    let stats = client.stats();
    let messages = client.view().log().len();
    let lines = [
        "    Session Statistics:".to_string(),
        format!("      Messages shown: {messages}"),
        format!("      Requests sent: {}", stats.sent),
        format!("      Answers: {}", stats.answered),
        format!("      Backend errors: {}", stats.backend_errors),
        format!("      Malformed replies: {}", stats.malformed),
        format!("      Failures: {}", stats.failures),
        format!("      Timeouts: {}", stats.timed_out),
        format!("      Cancelled: {}", stats.cancelled),
        format!("      Pending: {}", stats.pending),
    ];
    for line in lines {
        client.view_mut().print_info(&line)?;
    }
    Ok(())
}

fn print_config(client: &mut Client, config: &ChatConfig) -> chatdesk::Result<()> {
    let timeout = client
        .timeout()
        .map(|t| format!("{} seconds", t.as_secs()))
        .unwrap_or_else(|| "none".to_string());
    let lines = [
        "    Current Configuration:".to_string(),
        format!("      Backend: {}", config.base_url),
        format!("      Timeout: {timeout}"),
        format!("      Send policy: {:?}", client.send_policy()),
        format!("      Response policy: {:?}", client.response_policy()),
        format!(
            "      Color: {}",
            if config.use_color { "on" } else { "off" }
        ),
    ];
    for line in lines {
        client.view_mut().print_info(&line)?;
    }
    Ok(())
}
