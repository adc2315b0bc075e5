//! PersistedRecord: what goes into the key-value store after each change.

use crate::models::match_state::{MatchError, MatchState};
use serde::{Deserialize, Serialize};

/// Current state, undo history, and the save time in ms since the Unix epoch.
///
/// Serialized flat: `{scoreRed, ..., positions, history: [...], timestamp}`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    #[serde(flatten)]
    pub state: MatchState,
    #[serde(default)]
    pub history: Vec<MatchState>,
    pub timestamp: i64,
}

impl PersistedRecord {
    pub fn new(state: MatchState, history: Vec<MatchState>, timestamp: i64) -> Self {
        Self {
            state,
            history,
            timestamp,
        }
    }

    /// Age in ms at `now_ms` (negative if saved "in the future").
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.timestamp
    }

    /// Validate the current state and every history snapshot.
    pub fn validate(&self) -> Result<(), MatchError> {
        self.state.validate()?;
        for snapshot in &self.history {
            snapshot.validate()?;
        }
        Ok(())
    }
}
