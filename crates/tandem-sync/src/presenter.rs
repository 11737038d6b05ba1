//! What a session shows to the person at the keyboard.

use smol_str::SmolStr;
use tandem_common::transport::Collaborator;

use crate::coordinator::SessionState;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}

/// A message for the status surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warn,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Status indicators and the read-only toggle of the editing surface.
pub trait Presenter {
    fn is_read_only(&self) -> bool;

    fn set_read_only(&mut self, read_only: bool);

    /// A remote collaborator started typing.
    fn show_remote_typing(&mut self, who: &Collaborator);

    /// No remote collaborator is typing anymore.
    fn hide_remote_typing(&mut self);

    fn notify(&mut self, notice: Notice);

    /// Session lifecycle changed.
    fn state_changed(&mut self, _state: &SessionState) {}
}

/// Presenter that records every call. For tests and headless use.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    pub read_only: bool,
    /// Every value passed to `set_read_only`, in order.
    pub read_only_history: Vec<bool>,
    /// Display name currently shown as typing.
    pub typing_indicator: Option<SmolStr>,
    pub notices: Vec<Notice>,
    pub states: Vec<SessionState>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start out read-only, as when the user locked the buffer themselves.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Notice> {
        self.notices
            .iter()
            .filter(|n| n.level == NoticeLevel::Error)
    }
}

impl Presenter for RecordingPresenter {
    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
        self.read_only_history.push(read_only);
    }

    fn show_remote_typing(&mut self, who: &Collaborator) {
        self.typing_indicator = Some(who.display_name.clone());
    }

    fn hide_remote_typing(&mut self) {
        self.typing_indicator = None;
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn state_changed(&mut self, state: &SessionState) {
        self.states.push(state.clone());
    }
}
