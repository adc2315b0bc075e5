//! MatchEngine: owns the match state and its undo history.
//!
//! Every transition runs to completion and returns the resulting state. The
//! engine never asks for confirmation itself; [`MatchEngine::confirmation_for`]
//! tells the caller which commands should be gated and with what wording.

use crate::logic::confirm::{Command, Confirmation};
use crate::logic::scoring;
use crate::models::{
    default_seat_code, CourtSide, MatchState, PersistedRecord, Positions, Team, SETS_TO_WIN,
};
use serde::{Deserialize, Serialize};

/// Who serves first when a new set starts.
///
/// `KeepLast` leaves the serve with whoever served the last rally of the
/// previous set (the scoreboard's historical behaviour). `SetLoser` follows
/// the laws of badminton: the side that lost the set serves first.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextSetServer {
    #[default]
    KeepLast,
    SetLoser,
}

/// Result of `record_point`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PointOutcome {
    pub state: MatchState,
    /// Set decided by this rally, or already decided before it.
    pub set_winner: Option<Team>,
    /// False when the set was already decided and the rally was ignored.
    pub recorded: bool,
}

/// Result of `undo`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UndoOutcome {
    Restored(MatchState),
    NothingToUndo,
}

/// Result of `complete_set`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SetCompletion {
    pub match_over: bool,
    pub state: MatchState,
}

/// Everything a scoreboard needs to render, derived values included.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    #[serde(flatten)]
    pub state: MatchState,
    pub current_server: String,
    pub server_side: CourtSide,
    pub server_side_label: &'static str,
    pub set_winner: Option<Team>,
    pub set_points: Vec<Team>,
    pub match_winner: Option<Team>,
    pub can_undo: bool,
    pub history_len: usize,
}

#[derive(Clone, Debug, Default)]
pub struct MatchEngine {
    state: MatchState,
    history: Vec<MatchState>,
    next_set_server: NextSetServer,
}

impl MatchEngine {
    /// Fresh match in doubles or singles.
    pub fn new(is_doubles: bool) -> Self {
        Self {
            state: MatchState::new(is_doubles),
            ..Self::default()
        }
    }

    /// Resume from a state and its history (oldest snapshot first).
    pub fn from_parts(state: MatchState, history: Vec<MatchState>) -> Self {
        Self {
            state,
            history,
            next_set_server: NextSetServer::default(),
        }
    }

    pub fn from_record(record: PersistedRecord) -> Self {
        Self::from_parts(record.state, record.history)
    }

    pub fn with_next_set_server(mut self, rule: NextSetServer) -> Self {
        self.next_set_server = rule;
        self
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn history(&self) -> &[MatchState] {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Snapshot for the key-value store.
    pub fn to_record(&self, timestamp: i64) -> PersistedRecord {
        PersistedRecord::new(self.state.clone(), self.history.clone(), timestamp)
    }

    /// Award a rally to `winner`. Once the set is decided further rallies are
    /// ignored (no history entry) until the set is completed or undone.
    pub fn record_point(&mut self, winner: Team) -> PointOutcome {
        let before = self.state.clone();
        let recorded = scoring::apply_rally(&mut self.state, winner);
        if recorded {
            self.history.push(before);
        }
        let set_winner = self.set_winner();
        log::debug!(
            "point {:?}: {}-{} serve {:?}",
            winner,
            self.state.score_red,
            self.state.score_blue,
            self.state.serving_team
        );
        PointOutcome {
            state: self.state.clone(),
            set_winner,
            recorded,
        }
    }

    /// Step back one rally.
    pub fn undo(&mut self) -> UndoOutcome {
        match self.history.pop() {
            Some(previous) => {
                self.state = previous;
                UndoOutcome::Restored(self.state.clone())
            }
            None => UndoOutcome::NothingToUndo,
        }
    }

    /// Credit a set to `winner`. Starts the next set unless the match is now decided.
    pub fn complete_set(&mut self, winner: Team) -> SetCompletion {
        let sets = self.state.sets_mut(winner);
        *sets = sets.saturating_add(1).min(SETS_TO_WIN);
        let match_over = *sets >= SETS_TO_WIN;

        self.state.positions = Positions::default();
        self.history.clear();
        if match_over {
            // Scores and sets stay on the board until a new match is started.
            self.state.serving_team = Team::Red;
        } else {
            self.state.score_red = 0;
            self.state.score_blue = 0;
            if self.next_set_server == NextSetServer::SetLoser {
                self.state.serving_team = winner.opponent();
            }
        }
        log::debug!(
            "set to {:?}: sets {}-{}{}",
            winner,
            self.state.sets_red,
            self.state.sets_blue,
            if match_over { " (match over)" } else { "" }
        );
        SetCompletion {
            match_over,
            state: self.state.clone(),
        }
    }

    /// Flip singles/doubles. Always wipes scores, sets, seating and history.
    pub fn toggle_mode(&mut self) -> MatchState {
        let is_doubles = !self.state.is_doubles;
        self.state.is_doubles = is_doubles;
        self.full_reset()
    }

    /// Back to a fresh match in the current mode.
    pub fn full_reset(&mut self) -> MatchState {
        self.state = MatchState::new(self.state.is_doubles);
        self.history.clear();
        self.state.clone()
    }

    /// Rename the player on `side` of `team`. Blank names fall back to the seat code.
    /// Cosmetic: not recorded in history.
    pub fn rename_player(&mut self, team: Team, side: CourtSide, name: &str) -> MatchState {
        let trimmed = name.trim();
        let name = if trimmed.is_empty() {
            default_seat_code(team, side).to_string()
        } else {
            trimmed.to_string()
        };
        self.state.positions.team_mut(team).set(side, name);
        self.state.clone()
    }

    pub fn set_winner(&self) -> Option<Team> {
        scoring::set_winner(self.state.score_red, self.state.score_blue)
    }

    pub fn set_points(&self) -> Vec<Team> {
        scoring::set_points(&self.state)
    }

    pub fn match_winner(&self) -> Option<Team> {
        scoring::match_winner(&self.state)
    }

    pub fn current_server(&self) -> &str {
        scoring::current_server(&self.state)
    }

    pub fn server_side(&self) -> CourtSide {
        scoring::server_side(&self.state)
    }

    /// Dialog to show before running `command`, or `None` if it can run straight away.
    pub fn confirmation_for(&self, command: Command) -> Option<Confirmation> {
        match command {
            Command::CompleteSet { team } => {
                if self.state.sets(team) + 1 >= SETS_TO_WIN {
                    Some(Confirmation::match_point_won(team))
                } else {
                    Some(Confirmation::set_won(team))
                }
            }
            Command::ToggleMode if self.can_undo() => Some(Confirmation::toggle_mode()),
            Command::ToggleMode => None,
            Command::Reset => Some(Confirmation::reset()),
            Command::NewMatch => Some(
                self.match_winner()
                    .map(Confirmation::new_match)
                    .unwrap_or_else(Confirmation::reset),
            ),
        }
    }

    pub fn view(&self) -> MatchView {
        let server_side = self.server_side();
        MatchView {
            state: self.state.clone(),
            current_server: self.current_server().to_string(),
            server_side,
            server_side_label: server_side.label(),
            set_winner: self.set_winner(),
            set_points: self.set_points(),
            match_winner: self.match_winner(),
            can_undo: self.can_undo(),
            history_len: self.history.len(),
        }
    }
}
