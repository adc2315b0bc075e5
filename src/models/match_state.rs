//! MatchState: the snapshotted unit of a badminton match.

use crate::models::team::{Positions, Team};
use serde::{Deserialize, Serialize};

/// Points needed to take a set when leading by `WIN_MARGIN`.
pub const WINNING_SCORE: u32 = 21;
/// Lead required at or past `WINNING_SCORE`.
pub const WIN_MARGIN: u32 = 2;
/// A set ends at this score whatever the margin.
pub const SCORE_CAP: u32 = 30;
/// Best of three.
pub const SETS_TO_WIN: u32 = 2;

/// Errors surfaced by match operations that address a match or a decided set.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MatchError {
    /// No live match with this id.
    MatchNotFound,
    /// Set completion requested for a team that has not won the current set.
    NotDecided(Team),
    /// A stored or submitted state breaks a score/set bound.
    InvalidState(String),
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::MatchNotFound => write!(f, "No match"),
            MatchError::NotDecided(team) => {
                write!(f, "{} has not won the current set", team.display_name())
            }
            MatchError::InvalidState(reason) => write!(f, "Invalid match state: {}", reason),
        }
    }
}

impl std::error::Error for MatchError {}

/// Scores, sets, serve and seating of the active match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    pub score_red: u32,
    pub score_blue: u32,
    pub sets_red: u32,
    pub sets_blue: u32,
    pub serving_team: Team,
    pub is_doubles: bool,
    pub positions: Positions,
}

impl Default for MatchState {
    fn default() -> Self {
        Self {
            score_red: 0,
            score_blue: 0,
            sets_red: 0,
            sets_blue: 0,
            serving_team: Team::Red,
            is_doubles: true,
            positions: Positions::default(),
        }
    }
}

impl MatchState {
    /// Fresh match in the given mode.
    pub fn new(is_doubles: bool) -> Self {
        Self {
            is_doubles,
            ..Self::default()
        }
    }

    pub fn score(&self, team: Team) -> u32 {
        match team {
            Team::Red => self.score_red,
            Team::Blue => self.score_blue,
        }
    }

    pub fn score_mut(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::Red => &mut self.score_red,
            Team::Blue => &mut self.score_blue,
        }
    }

    pub fn sets(&self, team: Team) -> u32 {
        match team {
            Team::Red => self.sets_red,
            Team::Blue => self.sets_blue,
        }
    }

    pub fn sets_mut(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::Red => &mut self.sets_red,
            Team::Blue => &mut self.sets_blue,
        }
    }

    /// Check score and set bounds (used when restoring untrusted data).
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.score_red > SCORE_CAP || self.score_blue > SCORE_CAP {
            return Err(MatchError::InvalidState(format!(
                "score {}-{} exceeds {}",
                self.score_red, self.score_blue, SCORE_CAP
            )));
        }
        if self.sets_red > SETS_TO_WIN || self.sets_blue > SETS_TO_WIN {
            return Err(MatchError::InvalidState(format!(
                "sets {}-{} exceed {}",
                self.sets_red, self.sets_blue, SETS_TO_WIN
            )));
        }
        Ok(())
    }
}
