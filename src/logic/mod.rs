//! Scoreboard logic: scoring rules, the match engine, persistence, confirmations.

mod confirm;
mod engine;
mod persistence;
mod scoring;
mod session;

pub use confirm::{
    Command, ConfirmKind, Confirmation, Notice, NoticeBuffer, Notifier, Severity, DEFAULT_NOTICE_MS,
};
pub use engine::{MatchEngine, MatchView, NextSetServer, PointOutcome, SetCompletion, UndoOutcome};
pub use persistence::{
    load_or_create_secret, now_ms, purge_expired, FileStore, KeyValueStore, MatchStore, MemoryStore, StoreError,
    RECORD_TTL_MS, STORAGE_KEY,
};
pub use scoring::{apply_rally, current_server, match_winner, server_side, set_points, set_winner};
pub use session::MatchSession;
