//! Integration tests for MatchSession: persistence after each change, notices, confirmations.

use badminton_scoreboard_web::{
    now_ms, Command, CourtSide, KeyValueStore, MatchError, MatchSession, MatchState, MatchStore,
    MemoryStore, NoticeBuffer, PersistedRecord, Severity, Team, UndoOutcome,
};
use std::sync::Arc;

struct Fixture {
    store: MatchStore,
    notices: Arc<NoticeBuffer>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            store: MatchStore::new(Arc::new(MemoryStore::new())),
            notices: Arc::new(NoticeBuffer::new()),
        }
    }

    /// Fixture whose store already holds `state` (saved just now).
    fn with_saved(state: MatchState) -> Self {
        let f = Self::new();
        f.store
            .save(&PersistedRecord::new(state, Vec::new(), now_ms()))
            .unwrap();
        f
    }

    fn open(&self) -> MatchSession {
        MatchSession::open(self.store.clone(), self.notices.clone())
    }

    fn saved(&self) -> PersistedRecord {
        self.store.load().expect("record should be saved")
    }

    fn messages(&self) -> Vec<String> {
        self.notices.drain().into_iter().map(|n| n.message).collect()
    }
}

#[test]
fn opens_with_defaults_when_nothing_saved() {
    let f = Fixture::new();
    let s = f.open();
    assert_eq!(s.state(), &MatchState::default());
}

#[test]
fn opens_the_saved_match() {
    let saved = MatchState {
        score_red: 7,
        score_blue: 9,
        serving_team: Team::Blue,
        ..MatchState::default()
    };
    let f = Fixture::with_saved(saved.clone());
    assert_eq!(f.open().state(), &saved);
}

#[test]
fn resumes_from_an_already_loaded_record() {
    let saved = MatchState {
        score_blue: 19,
        serving_team: Team::Blue,
        ..MatchState::default()
    };
    let f = Fixture::with_saved(saved.clone());
    let record = f.store.load().unwrap();
    // Expire the stored copy: the session must use the record it was handed.
    f.store.clear().unwrap();

    let mut s = MatchSession::from_record(f.store.clone(), record, f.notices.clone());
    assert_eq!(s.state(), &saved);
    s.point(Team::Blue);
    assert_eq!(f.saved().state.score_blue, 20);
}

#[test]
fn ignored_rally_after_set_is_not_saved_again() {
    let f = Fixture::with_saved(MatchState {
        score_red: 21,
        score_blue: 3,
        ..MatchState::default()
    });
    let mut s = f.open();
    let before = f.saved();
    let c = s.point(Team::Blue).expect("set still awaits completion");
    assert_eq!(c.command, Command::CompleteSet { team: Team::Red });
    assert_eq!(f.saved().timestamp, before.timestamp);
    assert_eq!(f.saved().state, before.state);
}

#[test]
fn every_point_is_saved_with_history() {
    let f = Fixture::new();
    let mut s = f.open();
    assert_eq!(s.point(Team::Red), None);
    assert_eq!(s.point(Team::Blue), None);

    let record = f.saved();
    assert_eq!(record.state, *s.state());
    assert_eq!(record.history.len(), 2);
    assert!(record.timestamp <= now_ms());
}

#[test]
fn start_replaces_saved_state() {
    let f = Fixture::with_saved(MatchState {
        score_red: 11,
        ..MatchState::default()
    });
    let s = MatchSession::start(f.store.clone(), f.notices.clone(), false);
    assert_eq!(s.state(), &MatchState::new(false));
    assert_eq!(f.saved().state, MatchState::new(false));
}

#[test]
fn undo_notifies_only_when_something_was_undone() {
    let f = Fixture::new();
    let mut s = f.open();
    assert_eq!(s.undo(), UndoOutcome::NothingToUndo);
    assert!(f.messages().is_empty());

    s.point(Team::Blue);
    assert_eq!(s.undo(), UndoOutcome::Restored(MatchState::default()));
    let notices = f.notices.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Undid last rally");
    assert_eq!(notices[0].severity, Severity::Info);
    assert_eq!(f.saved().state, MatchState::default());
}

#[test]
fn winning_rally_asks_to_complete_the_set() {
    let f = Fixture::with_saved(MatchState {
        score_red: 20,
        score_blue: 4,
        ..MatchState::default()
    });
    let mut s = f.open();
    let c = s.point(Team::Red).expect("set point converted");
    assert_eq!(c.command, Command::CompleteSet { team: Team::Red });

    assert_eq!(
        s.complete_set(Team::Blue),
        Err(MatchError::NotDecided(Team::Blue))
    );

    assert_eq!(s.run(c.command), None);
    assert_eq!((s.state().score_red, s.state().sets_red), (0, 1));
    assert_eq!(f.messages(), vec!["Next set started".to_string()]);
    assert_eq!(f.saved().state.sets_red, 1);
    assert!(f.saved().history.is_empty());
}

#[test]
fn deciding_set_offers_a_new_match() {
    let f = Fixture::with_saved(MatchState {
        score_red: 8,
        score_blue: 20,
        sets_blue: 1,
        serving_team: Team::Blue,
        ..MatchState::default()
    });
    let mut s = f.open();
    let c = s.point(Team::Blue).unwrap();
    assert_eq!(c.title, "Match over");

    let follow_up = s.complete_set(Team::Blue).unwrap().expect("new match dialog");
    assert_eq!(follow_up.command, Command::NewMatch);
    assert_eq!(s.state().sets_blue, 2);
    assert_eq!(s.state().score_blue, 21);

    s.run(Command::NewMatch);
    assert_eq!(s.state(), &MatchState::default());
}

#[test]
fn toggle_mode_is_confirmed_only_with_history() {
    let f = Fixture::new();
    let mut s = f.open();
    assert_eq!(s.request(Command::ToggleMode), None);
    assert!(!s.state().is_doubles);
    assert_eq!(f.messages(), vec!["Switched to singles mode".to_string()]);

    s.point(Team::Red);
    let c = s.request(Command::ToggleMode).expect("needs confirming");
    assert_eq!(s.state().score_red, 1);

    s.run(c.command);
    let record = f.saved();
    assert!(record.state.is_doubles);
    assert_eq!(record.state.score_red, 0);
    assert!(record.history.is_empty());
}

#[test]
fn reset_is_always_confirmed_and_keeps_mode() {
    let f = Fixture::with_saved(MatchState {
        score_red: 5,
        is_doubles: false,
        ..MatchState::default()
    });
    let mut s = f.open();
    let c = s.request(Command::Reset).expect("reset is confirmed");
    assert_eq!(s.state().score_red, 5);

    s.run(c.command);
    assert_eq!(s.state(), &MatchState::new(false));
    assert_eq!(f.saved().state, MatchState::new(false));
    assert_eq!(f.messages(), vec!["Match reset".to_string()]);
}

#[test]
fn rename_is_saved() {
    let f = Fixture::new();
    let mut s = f.open();
    s.rename(Team::Blue, CourtSide::Left, " Ana ");
    assert_eq!(f.saved().state.positions.blue.left, "Ana");
    assert!(f.saved().history.is_empty());
}

#[test]
fn stale_saved_match_is_not_resumed() {
    let kv = Arc::new(MemoryStore::new());
    let store = MatchStore::new(kv.clone());
    let state = MatchState {
        score_blue: 14,
        ..MatchState::default()
    };
    store
        .save(&PersistedRecord::new(state, Vec::new(), now_ms() - 2 * 60 * 60 * 1000))
        .unwrap();
    let s = MatchSession::open(store.clone(), Arc::new(NoticeBuffer::new()));
    assert_eq!(s.state(), &MatchState::default());
    assert_eq!(kv.get(store.key()).unwrap(), None);
}
