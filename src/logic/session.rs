//! MatchSession: one engine wired to its persistence and notice surface.

use crate::logic::confirm::{Command, Confirmation, Notice, Notifier, Severity};
use crate::logic::engine::{MatchEngine, MatchView, NextSetServer, UndoOutcome};
use crate::logic::persistence::{now_ms, MatchStore};
use crate::models::{CourtSide, MatchError, MatchState, PersistedRecord, Team};
use std::sync::Arc;

/// A live scoreboard. Every change is saved; destructive commands go through
/// [`MatchSession::request`] so the caller can confirm them first.
pub struct MatchSession {
    engine: MatchEngine,
    store: MatchStore,
    notifier: Arc<dyn Notifier>,
}

impl MatchSession {
    /// Resume the saved match, or start a fresh doubles match.
    pub fn open(store: MatchStore, notifier: Arc<dyn Notifier>) -> Self {
        match store.load() {
            Some(record) => Self::from_record(store, record, notifier),
            None => Self {
                engine: MatchEngine::new(true),
                store,
                notifier,
            },
        }
    }

    /// Resume from a record the caller already loaded from `store`.
    pub fn from_record(
        store: MatchStore,
        record: PersistedRecord,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        log::info!("Restored match from {}", store.key());
        Self {
            engine: MatchEngine::from_record(record),
            store,
            notifier,
        }
    }

    /// Start a brand new match, replacing anything saved under the store's key.
    pub fn start(store: MatchStore, notifier: Arc<dyn Notifier>, is_doubles: bool) -> Self {
        let session = Self {
            engine: MatchEngine::new(is_doubles),
            store,
            notifier,
        };
        session.persist();
        session
    }

    pub fn with_next_set_server(mut self, rule: NextSetServer) -> Self {
        self.engine = self.engine.with_next_set_server(rule);
        self
    }

    pub fn state(&self) -> &MatchState {
        self.engine.state()
    }

    pub fn view(&self) -> MatchView {
        self.engine.view()
    }

    /// Record a rally. Returns the dialog to show if it decided the set.
    pub fn point(&mut self, winner: Team) -> Option<Confirmation> {
        let outcome = self.engine.record_point(winner);
        if outcome.recorded {
            self.persist();
        }
        outcome
            .set_winner
            .and_then(|team| self.engine.confirmation_for(Command::CompleteSet { team }))
    }

    pub fn undo(&mut self) -> UndoOutcome {
        let outcome = self.engine.undo();
        if let UndoOutcome::Restored(_) = outcome {
            self.persist();
            self.notify("Undid last rally", Severity::Info);
        }
        outcome
    }

    /// Credit the current set to `winner`. Fails if the score does not give them the set.
    pub fn complete_set(&mut self, winner: Team) -> Result<Option<Confirmation>, MatchError> {
        if self.engine.set_winner() != Some(winner) {
            return Err(MatchError::NotDecided(winner));
        }
        Ok(self.run(Command::CompleteSet { team: winner }))
    }

    pub fn rename(&mut self, team: Team, side: CourtSide, name: &str) {
        self.engine.rename_player(team, side, name);
        self.persist();
    }

    /// Run `command` now unless it needs confirming; then the dialog is returned instead.
    pub fn request(&mut self, command: Command) -> Option<Confirmation> {
        match self.engine.confirmation_for(command) {
            Some(confirmation) => Some(confirmation),
            None => self.run(command),
        }
    }

    /// Execute a (confirmed) command. Returns a follow-up dialog, if any.
    pub fn run(&mut self, command: Command) -> Option<Confirmation> {
        match command {
            Command::CompleteSet { team } => {
                let completion = self.engine.complete_set(team);
                self.persist();
                if completion.match_over {
                    self.notify(
                        format!("{} wins the match", team.display_name()),
                        Severity::Success,
                    );
                    self.engine.confirmation_for(Command::NewMatch)
                } else {
                    self.notify("Next set started", Severity::Success);
                    None
                }
            }
            Command::ToggleMode => {
                let state = self.engine.toggle_mode();
                self.reset_storage();
                let mode = if state.is_doubles { "doubles" } else { "singles" };
                self.notify(format!("Switched to {} mode", mode), Severity::Success);
                None
            }
            Command::Reset | Command::NewMatch => {
                self.engine.full_reset();
                self.reset_storage();
                self.notify("Match reset", Severity::Success);
                None
            }
        }
    }

    /// Drop the saved record (history included) and write the fresh state, so the mode survives a reload.
    fn reset_storage(&self) {
        if let Err(e) = self.store.clear() {
            log::warn!("Failed to clear saved state {}: {}", self.store.key(), e);
        }
        self.persist();
    }

    fn persist(&self) {
        let record = self.engine.to_record(now_ms());
        if let Err(e) = self.store.save(&record) {
            log::warn!("Failed to save state {}: {}", self.store.key(), e);
        }
    }

    fn notify(&self, message: impl Into<String>, severity: Severity) {
        self.notifier.notify(Notice::new(message, severity));
    }
}
