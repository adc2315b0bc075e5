//! Integration tests for the scoring rules: set decision and derived server.

use badminton_scoreboard_web::{
    current_server, match_winner, server_side, set_points, set_winner, CourtSide, MatchState, Team,
};

fn state_at(score_red: u32, score_blue: u32) -> MatchState {
    MatchState {
        score_red,
        score_blue,
        ..MatchState::default()
    }
}

#[test]
fn set_rule_boundaries() {
    assert_eq!(set_winner(29, 29), None);
    assert_eq!(set_winner(30, 29), Some(Team::Red));
    assert_eq!(set_winner(21, 19), Some(Team::Red));
    assert_eq!(set_winner(21, 20), None);
    assert_eq!(set_winner(22, 20), Some(Team::Red));
    assert_eq!(set_winner(29, 30), Some(Team::Blue));
    assert_eq!(set_winner(19, 21), Some(Team::Blue));
    assert_eq!(set_winner(20, 20), None);
    assert_eq!(set_winner(0, 0), None);
}

#[test]
fn set_points_near_the_end_of_a_set() {
    assert_eq!(set_points(&state_at(20, 15)), vec![Team::Red]);
    assert_eq!(set_points(&state_at(20, 20)), Vec::<Team>::new());
    assert_eq!(set_points(&state_at(21, 20)), vec![Team::Red]);
    // At 29-all whoever wins the rally takes the set.
    assert_eq!(set_points(&state_at(29, 29)), vec![Team::Red, Team::Blue]);
    // Already decided: nothing left to play for.
    assert!(set_points(&state_at(21, 10)).is_empty());
}

#[test]
fn server_side_follows_serving_team_score_parity() {
    let mut s = state_at(3, 4);
    s.serving_team = Team::Blue;
    assert_eq!(server_side(&s), CourtSide::Right);
    assert_eq!(server_side(&s).label(), "右");
    s.serving_team = Team::Red;
    assert_eq!(server_side(&s), CourtSide::Left);
    assert_eq!(server_side(&s).label(), "左");
}

#[test]
fn current_server_in_doubles_and_singles() {
    let mut s = state_at(0, 0);
    assert_eq!(current_server(&s), "A1");
    s.score_red = 1;
    assert_eq!(current_server(&s), "A2");
    s.serving_team = Team::Blue;
    s.score_blue = 2;
    assert_eq!(current_server(&s), "B1");

    s.is_doubles = false;
    assert_eq!(current_server(&s), "B");
    s.serving_team = Team::Red;
    assert_eq!(current_server(&s), "A");
}

#[test]
fn match_winner_needs_two_sets() {
    let mut s = MatchState::default();
    s.sets_red = 1;
    s.sets_blue = 1;
    assert_eq!(match_winner(&s), None);
    s.sets_blue = 2;
    assert_eq!(match_winner(&s), Some(Team::Blue));
}
