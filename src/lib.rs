//! Badminton scoreboard: library with the match models and scoring logic.

pub mod logic;
pub mod models;

pub use logic::{
    apply_rally, current_server, load_or_create_secret, match_winner, now_ms, purge_expired, server_side, set_points,
    set_winner, Command, ConfirmKind, Confirmation, FileStore, KeyValueStore, MatchEngine,
    MatchSession, MatchStore, MatchView, MemoryStore, NextSetServer, Notice, NoticeBuffer,
    Notifier, PointOutcome, SetCompletion, Severity, StoreError, UndoOutcome,
    DEFAULT_NOTICE_MS, RECORD_TTL_MS, STORAGE_KEY,
};
pub use models::{
    default_seat_code, CourtSide, MatchError, MatchState, PersistedRecord, Positions, Seats, Team,
    SCORE_CAP, SETS_TO_WIN, WINNING_SCORE, WIN_MARGIN,
};
