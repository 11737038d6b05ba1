//! Status output on stderr.

use std::io::Write;

use tandem_common::transport::Collaborator;
use tandem_sync::{Notice, NoticeLevel, Presenter, SessionState};

/// Wrap `text` in a 24-bit ANSI foreground colour taken from an RGBA value.
pub fn paint(text: &str, rgba: u32) -> String {
    let [r, g, b, _] = rgba.to_be_bytes();
    format!("\x1b[38;2;{r};{g};{b}m{text}\x1b[0m")
}

/// Prints notices and typing status to stderr, keeping stdout for buffer
/// contents.
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    read_only: bool,
    typing: Option<String>,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&self, prefix: &str, message: &str) {
        let mut err = std::io::stderr().lock();
        // Nothing sensible to do if stderr is gone
        let _ = writeln!(err, "{prefix} {message}");
    }
}

impl Presenter for TerminalPresenter {
    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn set_read_only(&mut self, read_only: bool) {
        if self.read_only != read_only {
            self.read_only = read_only;
            let message = if read_only {
                "buffer locked"
            } else {
                "buffer unlocked"
            };
            self.line("·", message);
        }
    }

    fn show_remote_typing(&mut self, who: &Collaborator) {
        if self.typing.as_deref() != Some(who.display_name.as_str()) {
            let name = paint(&who.display_name, who.color);
            self.line("✎", &format!("{name} is typing"));
            self.typing = Some(who.display_name.to_string());
        }
    }

    fn hide_remote_typing(&mut self) {
        if let Some(name) = self.typing.take() {
            self.line("✎", &format!("{name} stopped typing"));
        }
    }

    fn notify(&mut self, notice: Notice) {
        let prefix = match notice.level {
            NoticeLevel::Info => "✓",
            NoticeLevel::Warn => "⚠",
            NoticeLevel::Error => "✗",
        };
        self.line(prefix, &notice.message);
    }

    fn state_changed(&mut self, state: &SessionState) {
        tracing::debug!(%state, "session state changed");
    }
}
