//! Team, court side, and seating (who stands right/left for each team).

use serde::{Deserialize, Serialize};

/// One side of the net.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Team {
    #[default]
    Red,
    Blue,
}

impl Team {
    pub fn opponent(self) -> Self {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    /// Fixed server label in singles ("A" for Red, "B" for Blue).
    pub fn singles_label(self) -> &'static str {
        match self {
            Team::Red => "A",
            Team::Blue => "B",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Team::Red => "Red",
            Team::Blue => "Blue",
        }
    }
}

/// Service court half. Even score serves from the right, odd from the left.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtSide {
    Right,
    Left,
}

impl CourtSide {
    pub fn for_score(score: u32) -> Self {
        if score % 2 == 0 {
            CourtSide::Right
        } else {
            CourtSide::Left
        }
    }

    /// Label shown on the scoreboard ("右" / "左").
    pub fn label(self) -> &'static str {
        match self {
            CourtSide::Right => "右",
            CourtSide::Left => "左",
        }
    }
}

/// Default seat code for a team/side: A1/A2 for Red, B1/B2 for Blue.
pub fn default_seat_code(team: Team, side: CourtSide) -> &'static str {
    match (team, side) {
        (Team::Red, CourtSide::Right) => "A1",
        (Team::Red, CourtSide::Left) => "A2",
        (Team::Blue, CourtSide::Right) => "B1",
        (Team::Blue, CourtSide::Left) => "B2",
    }
}

/// The two players of one team by court side.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Seats {
    pub right: String,
    pub left: String,
}

impl Seats {
    pub fn default_for(team: Team) -> Self {
        Self {
            right: default_seat_code(team, CourtSide::Right).to_string(),
            left: default_seat_code(team, CourtSide::Left).to_string(),
        }
    }

    pub fn get(&self, side: CourtSide) -> &str {
        match side {
            CourtSide::Right => &self.right,
            CourtSide::Left => &self.left,
        }
    }

    pub fn set(&mut self, side: CourtSide, name: String) {
        match side {
            CourtSide::Right => self.right = name,
            CourtSide::Left => self.left = name,
        }
    }

    /// Partners change halves (serving team kept the serve).
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.right, &mut self.left);
    }
}

/// Seating for both teams. Only meaningful in doubles.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Positions {
    #[serde(rename = "Red")]
    pub red: Seats,
    #[serde(rename = "Blue")]
    pub blue: Seats,
}

impl Default for Positions {
    fn default() -> Self {
        Self {
            red: Seats::default_for(Team::Red),
            blue: Seats::default_for(Team::Blue),
        }
    }
}

impl Positions {
    pub fn team(&self, team: Team) -> &Seats {
        match team {
            Team::Red => &self.red,
            Team::Blue => &self.blue,
        }
    }

    pub fn team_mut(&mut self, team: Team) -> &mut Seats {
        match team {
            Team::Red => &mut self.red,
            Team::Blue => &mut self.blue,
        }
    }
}
