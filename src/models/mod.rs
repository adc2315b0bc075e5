//! Data structures for the scoreboard: teams, seating, match state, persisted record.

mod match_state;
mod record;
mod team;

pub use match_state::{MatchError, MatchState, SCORE_CAP, SETS_TO_WIN, WINNING_SCORE, WIN_MARGIN};
pub use record::PersistedRecord;
pub use team::{default_seat_code, CourtSide, Positions, Seats, Team};
