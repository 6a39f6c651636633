//! Terminal rendering of the conversation log.
//!
//! [`TerminalView`] is a [`LogView`] that draws each entry as one or more
//! lines on a terminal.  A terminal cannot delete arbitrary lines, so removal
//! only erases what is on screen when the entry is the last thing drawn and
//! ANSI styling is enabled; the in-memory [`ConversationLog`] is always
//! updated.

use std::io::{self, Stdout, Write};

use crate::error::{Error, Result};
use crate::history::ConversationLog;
use crate::message::{EntryId, Message, Sender, THINKING};
use crate::view::LogView;

/// ANSI escape code for dim text (used for metadata and the placeholder).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for italic text (used for the placeholder).
const ANSI_ITALIC: &str = "\x1b[3m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the user label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the bot label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for error lines).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code that clears from the cursor to the end of the screen.
const ANSI_CLEAR_BELOW: &str = "\x1b[J";

/// Label printed before user messages.
pub const USER_LABEL: &str = "You:";

/// Label printed before bot messages.
pub const BOT_LABEL: &str = "Bot:";

/// A [`LogView`] that writes to a terminal.
pub struct TerminalView<W: Write = Stdout> {
    out: W,
    use_color: bool,
    echo_user: bool,
    log: ConversationLog,
    // Entries drawn since anything else was written, with their line counts.
    drawn: Vec<(EntryId, usize)>,
}

impl TerminalView<Stdout> {
    /// Creates a view on stdout with ANSI styling enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a view on stdout with the specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl Default for TerminalView<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TerminalView<W> {
    /// Creates a view on an arbitrary writer.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            echo_user: true,
            log: ConversationLog::new(),
            drawn: Vec::new(),
        }
    }

    /// Whether user messages are drawn when appended.
    ///
    /// A line editor already leaves the typed line on screen, so drawing it
    /// again would show it twice.  The message is still recorded.
    pub fn with_user_echo(mut self, echo_user: bool) -> Self {
        self.echo_user = echo_user;
        self
    }

    /// The entries currently in the log.
    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// The underlying writer.
    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Print an informational line outside the log.
    pub fn print_info(&mut self, info: &str) -> Result<()> {
        self.drawn.clear();
        writeln!(self.out, "{info}")?;
        self.out.flush()?;
        Ok(())
    }

    /// Print an error line outside the log.
    pub fn print_error(&mut self, error: &str) -> Result<()> {
        self.drawn.clear();
        if self.use_color {
            writeln!(self.out, "{ANSI_RED}Error: {error}{ANSI_RESET}")?;
        } else {
            writeln!(self.out, "Error: {error}")?;
        }
        self.out.flush()?;
        Ok(())
    }

    /// Draw every entry again, user messages included.
    pub fn redraw(&mut self) -> Result<()> {
        self.drawn.clear();
        let messages: Vec<Message> = self.log.messages().into_iter().cloned().collect();
        for message in &messages {
            self.draw(message)
                .map_err(|err| Error::io("failed to redraw the log", err))?;
        }
        self.out.flush()?;
        Ok(())
    }

    // The log stays authoritative when the terminal cannot be written.
    fn report(result: io::Result<()>, action: &str) {
        if let Err(err) = result {
            let err = Error::io(format!("failed to {action}"), err);
            log::warn!("{err}");
        }
    }

    fn draw(&mut self, message: &Message) -> io::Result<usize> {
        let (label, label_color) = match message.sender {
            Sender::User => (USER_LABEL, ANSI_CYAN),
            Sender::Bot => (BOT_LABEL, ANSI_GREEN),
        };
        let placeholder = message.sender == Sender::Bot && message.text == THINKING;
        let indent = " ".repeat(label.len() + 1);

        let mut lines = 0;
        let mut body = message.text.split('\n');
        let first = body.next().unwrap_or_default();
        if self.use_color {
            let style = if placeholder {
                format!("{ANSI_DIM}{ANSI_ITALIC}")
            } else {
                String::new()
            };
            writeln!(
                self.out,
                "{label_color}{label}{ANSI_RESET} {style}{first}{ANSI_RESET}"
            )?;
        } else {
            writeln!(self.out, "{label} {first}")?;
        }
        lines += 1;
        for line in body {
            writeln!(self.out, "{indent}{line}")?;
            lines += 1;
        }

        if let Some(meta) = message.meta_line() {
            if self.use_color {
                writeln!(self.out, "{indent}{ANSI_DIM}{meta}{ANSI_RESET}")?;
            } else {
                writeln!(self.out, "{indent}{meta}")?;
            }
            lines += 1;
        }
        Ok(lines)
    }
}

impl<W: Write> LogView for TerminalView<W> {
    fn append(&mut self, message: Message) -> EntryId {
        let visible = self.echo_user || message.sender != Sender::User;
        let id = self.log.append(message.clone());
        if visible {
            match self.draw(&message) {
                Ok(lines) => self.drawn.push((id, lines)),
                Err(err) => Self::report(Err(err), "draw an entry"),
            }
        }
        id
    }

    fn remove(&mut self, id: EntryId) -> bool {
        let removed = self.log.remove(id);
        match self.drawn.last() {
            Some(&(last, lines)) if last == id && self.use_color => {
                let erased = write!(self.out, "\x1b[{lines}F{ANSI_CLEAR_BELOW}")
                    .and_then(|()| self.out.flush());
                Self::report(erased, "erase an entry");
                self.drawn.pop();
            }
            _ => self.drawn.retain(|(entry, _)| *entry != id),
        }
        removed
    }

    fn scroll_to_end(&mut self) {
        self.log.scroll_to_end();
        Self::report(self.out.flush(), "flush the terminal");
    }

    fn clear(&mut self) {
        self.log.clear();
        self.drawn.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Meta;

    fn output(view: &TerminalView<Vec<u8>>) -> String {
        String::from_utf8(view.writer().clone()).unwrap()
    }

    #[test]
    fn plain_rendering() {
        let mut view = TerminalView::with_writer(Vec::new(), false);
        view.append(Message::user("hello"));
        view.append(Message::answer("42", Meta::new("wiki", "0.9")));
        assert_eq!(
            output(&view),
            "You: hello\nBot: 42\n     Source: wiki | Confidence: 0.9\n"
        );
    }

    #[test]
    fn multiline_text_is_indented() {
        let mut view = TerminalView::with_writer(Vec::new(), false);
        view.append(Message::bot("one\ntwo"));
        assert_eq!(output(&view), "Bot: one\n     two\n");
    }

    #[test]
    fn user_echo_can_be_disabled() {
        let mut view = TerminalView::with_writer(Vec::new(), false).with_user_echo(false);
        view.append(Message::user("hello"));
        view.append(Message::bot("hi"));
        assert_eq!(output(&view), "Bot: hi\n");
        assert_eq!(view.log().len(), 2);

        view.redraw().unwrap();
        assert_eq!(output(&view), "Bot: hi\nYou: hello\nBot: hi\n");
    }

    #[test]
    fn removing_last_entry_erases_it() {
        let mut view = TerminalView::with_writer(Vec::new(), true);
        let id = view.append(Message::thinking());
        assert!(view.remove(id));
        assert!(output(&view).ends_with("\x1b[1F\x1b[J"));
        assert!(view.log().is_empty());
    }

    #[test]
    fn removing_without_color_only_updates_the_log() {
        let mut view = TerminalView::with_writer(Vec::new(), false);
        let id = view.append(Message::thinking());
        let before = output(&view);
        assert!(view.remove(id));
        assert_eq!(output(&view), before);
        assert!(!view.remove(id));
    }

    #[test]
    fn removing_an_older_entry_does_not_erase() {
        let mut view = TerminalView::with_writer(Vec::new(), true);
        let older = view.append(Message::thinking());
        view.append(Message::bot("later"));
        let before = output(&view);
        assert!(view.remove(older));
        assert_eq!(output(&view), before);
    }

    #[test]
    fn info_lines_stop_erasure() {
        let mut view = TerminalView::with_writer(Vec::new(), true);
        let id = view.append(Message::thinking());
        view.print_info("note").unwrap();
        let before = output(&view);
        view.remove(id);
        assert_eq!(output(&view), before);
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failures_surface_as_io_errors() {
        let mut view = TerminalView::with_writer(Broken, false);
        let err = view.print_info("note").unwrap_err();
        assert!(err.is_io(), "{err}");
        assert!(view.print_error("bad").unwrap_err().is_io());

        // The log is still updated when drawing fails.
        let id = view.append(Message::bot("hi"));
        assert!(view.log().contains(id));
        let err = view.redraw().unwrap_err();
        assert!(err.is_io());
        assert!(err.to_string().contains("redraw"), "{err}");
    }
}
