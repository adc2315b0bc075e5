//! Confirmation and notice surface.
//!
//! Destructive operations are described by a [`Command`]. The engine hands the
//! caller a [`Confirmation`] carrying the command; the caller runs it on
//! confirm and drops it on cancel. Notices are informational only.

use crate::models::Team;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// How long a notice stays on screen unless told otherwise.
pub const DEFAULT_NOTICE_MS: u64 = 3000;

/// A deferred, confirmable operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Credit the set to `team` and start the next one (or end the match).
    CompleteSet { team: Team },
    /// Switch singles/doubles; wipes the match.
    ToggleMode,
    /// Reset scores, sets and seating.
    Reset,
    /// Start over after a decided match.
    NewMatch,
}

/// Tone of a confirmation dialog.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmKind {
    Info,
    Warning,
    Danger,
}

/// A question for the user plus the command to run if they agree.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Confirmation {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub kind: ConfirmKind,
    pub command: Command,
}

impl Confirmation {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        confirm_label: impl Into<String>,
        kind: ConfirmKind,
        command: Command,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_label: confirm_label.into(),
            kind,
            command,
        }
    }

    /// Dialog for a finished set; asks to start the next one.
    pub fn set_won(team: Team) -> Self {
        Self::new(
            "Set over",
            format!("{} wins this set! Start the next set?", team.display_name()),
            "Next set",
            ConfirmKind::Info,
            Command::CompleteSet { team },
        )
    }

    /// Dialog for the deciding set; credits it and ends the match.
    pub fn match_point_won(team: Team) -> Self {
        Self::new(
            "Match over",
            format!("{} wins the match! Record the final set?", team.display_name()),
            "Finish match",
            ConfirmKind::Info,
            Command::CompleteSet { team },
        )
    }

    pub fn new_match(team: Team) -> Self {
        Self::new(
            "Match over",
            format!("{} wins! Start a new match?", team.display_name()),
            "Start new match",
            ConfirmKind::Info,
            Command::NewMatch,
        )
    }

    pub fn toggle_mode() -> Self {
        Self::new(
            "Switch mode",
            "Switching mode clears the current score. Continue?",
            "Switch",
            ConfirmKind::Warning,
            Command::ToggleMode,
        )
    }

    pub fn reset() -> Self {
        Self::new(
            "Reset match",
            "Reset the whole match? Scores go back to zero.",
            "Reset",
            ConfirmKind::Danger,
            Command::Reset,
        )
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Warning,
    Error,
    #[default]
    Info,
}

/// Fire-and-forget message that dismisses itself after `duration_ms` (0 = sticky).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
    pub duration_ms: u64,
}

impl Notice {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            duration_ms: DEFAULT_NOTICE_MS,
        }
    }
}

/// Receives notices. Must never block the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Collects notices until drained (e.g. to return them with an API response).
#[derive(Debug, Default)]
pub struct NoticeBuffer {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all collected notices, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => Vec::new(),
        }
    }
}

impl Notifier for NoticeBuffer {
    fn notify(&self, notice: Notice) {
        log::debug!("notice [{:?}]: {}", notice.severity, notice.message);
        if let Ok(mut guard) = self.notices.lock() {
            guard.push(notice);
        }
    }
}
