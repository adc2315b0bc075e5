//! Rally-point scoring rules: set decision, serve rotation, derived server.

use crate::models::{
    CourtSide, MatchState, Team, SCORE_CAP, SETS_TO_WIN, WINNING_SCORE, WIN_MARGIN,
};

/// Winner of the current set for a score, if any.
///
/// The cap is checked before the margin: 30-29 ends the set with a one-point lead.
pub fn set_winner(score_red: u32, score_blue: u32) -> Option<Team> {
    if score_red >= SCORE_CAP {
        return Some(Team::Red);
    }
    if score_blue >= SCORE_CAP {
        return Some(Team::Blue);
    }
    if score_red >= WINNING_SCORE && score_red >= score_blue.saturating_add(WIN_MARGIN) {
        return Some(Team::Red);
    }
    if score_blue >= WINNING_SCORE && score_blue >= score_red.saturating_add(WIN_MARGIN) {
        return Some(Team::Blue);
    }
    None
}

/// Teams that would take the set by winning the next rally (both at 29-29).
pub fn set_points(state: &MatchState) -> Vec<Team> {
    if set_winner(state.score_red, state.score_blue).is_some() {
        return Vec::new();
    }
    [Team::Red, Team::Blue]
        .into_iter()
        .filter(|&team| {
            let (red, blue) = match team {
                Team::Red => (state.score_red.saturating_add(1), state.score_blue),
                Team::Blue => (state.score_red, state.score_blue.saturating_add(1)),
            };
            set_winner(red, blue) == Some(team)
        })
        .collect()
}

/// Team that has taken two sets, if any.
pub fn match_winner(state: &MatchState) -> Option<Team> {
    if state.sets_red >= SETS_TO_WIN {
        Some(Team::Red)
    } else if state.sets_blue >= SETS_TO_WIN {
        Some(Team::Blue)
    } else {
        None
    }
}

/// Award one rally to `winner`: bump the score and update serve and seating.
///
/// Serving team wins: in doubles its players change halves, serve stays.
/// Receiving team wins: it takes the serve, nobody moves.
///
/// A set that is already decided (21 with a two-point lead, or 30) is frozen:
/// the rally is ignored and `false` is returned. No score can therefore pass
/// `SCORE_CAP`, and both teams can never sit at 30.
pub fn apply_rally(state: &mut MatchState, winner: Team) -> bool {
    if set_winner(state.score_red, state.score_blue).is_some() {
        return false;
    }
    let score = state.score_mut(winner);
    *score = score.saturating_add(1).min(SCORE_CAP);

    if state.serving_team == winner {
        if state.is_doubles {
            state.positions.team_mut(winner).swap();
        }
    } else {
        state.serving_team = winner;
    }
    true
}

/// Half the serve is delivered from: parity of the serving team's own score.
pub fn server_side(state: &MatchState) -> CourtSide {
    CourtSide::for_score(state.score(state.serving_team))
}

/// Who serves next: the player on `server_side` in doubles, "A"/"B" in singles.
pub fn current_server(state: &MatchState) -> &str {
    let team = state.serving_team;
    if state.is_doubles {
        state.positions.team(team).get(server_side(state))
    } else {
        team.singles_label()
    }
}
