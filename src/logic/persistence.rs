//! Expiring match persistence over a simple key-value store.
//!
//! A record lives under one key as JSON. It is discarded on load once it is
//! `ttl` old; unreadable records are logged and treated as absent.

use crate::models::PersistedRecord;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Key the scoreboard record is stored under.
pub const STORAGE_KEY: &str = "badminton_scoreboard_state";

/// Records older than this (ms) are stale.
pub const RECORD_TTL_MS: i64 = 60 * 60 * 1000;

/// Current wall-clock time in ms since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Errors from the underlying store.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
    /// A lock guarding in-memory entries was poisoned.
    Poisoned,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "store I/O error: {}", e),
            StoreError::Serialize(e) => write!(f, "cannot serialize record: {}", e),
            StoreError::Poisoned => write!(f, "store lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Serialize(e) => Some(e),
            StoreError::Poisoned => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialize(e)
    }
}

/// String key-value storage (browser local storage, a directory, a map).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// In-process store; contents die with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let g = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(g.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut g = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        g.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut g = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        g.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let g = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(g.keys().cloned().collect())
    }
}

/// One `<key>.json` file per key inside a directory.
///
/// Bytes outside `[A-Za-z0-9_-]` are written as `~xx` (hex) in file names.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir`, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
            out.push(b as char);
        } else {
            out.push_str(&format!("~{:02x}", b));
        }
    }
    out
}

fn decode_key(name: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(name.len());
    let mut iter = name.bytes();
    while let Some(b) = iter.next() {
        if b == b'~' {
            let hi = iter.next()?;
            let lo = iter.next()?;
            let hex = [hi, lo];
            let hex = std::str::from_utf8(&hex).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
        } else {
            bytes.push(b);
        }
    }
    String::from_utf8(bytes).ok()
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        // Write then rename: readers never see a partial record.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(stem) = name.strip_suffix(".json") {
                if let Some(key) = decode_key(stem) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }
}

/// Secret bytes kept in `path`, created with `generate` on first use.
///
/// Lets a value such as a cookie signing key survive restarts. A file shorter
/// than `min_len` bytes is replaced.
pub fn load_or_create_secret<F>(path: &Path, min_len: usize, generate: F) -> Result<Vec<u8>, StoreError>
where
    F: FnOnce() -> Vec<u8>,
{
    match std::fs::read(path) {
        Ok(bytes) if bytes.len() >= min_len => return Ok(bytes),
        Ok(_) => log::warn!("Secret in {} is too short; replacing it", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    let bytes = generate();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, &bytes)?;
    Ok(bytes)
}

/// Load/save/clear of one match record with a time-to-live.
#[derive(Clone)]
pub struct MatchStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    ttl_ms: i64,
}

impl std::fmt::Debug for MatchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchStore")
            .field("key", &self.key)
            .field("ttl_ms", &self.ttl_ms)
            .finish()
    }
}

impl MatchStore {
    /// Store under [`STORAGE_KEY`] with the default TTL.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, STORAGE_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            ttl_ms: RECORD_TTL_MS,
        }
    }

    pub fn with_ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Saved record, or `None` if missing, stale, or unreadable.
    pub fn load(&self) -> Option<PersistedRecord> {
        self.load_at(now_ms())
    }

    /// Same as [`MatchStore::load`] with an explicit clock. A stale record is deleted.
    pub fn load_at(&self, now_ms: i64) -> Option<PersistedRecord> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to read saved state {}: {}", self.key, e);
                return None;
            }
        };
        let record = parse_record(&raw)?;
        if record.age_ms(now_ms) >= self.ttl_ms {
            log::info!("Discarding saved state {} (older than {} ms)", self.key, self.ttl_ms);
            if let Err(e) = self.store.remove(&self.key) {
                log::warn!("Failed to remove stale state {}: {}", self.key, e);
            }
            return None;
        }
        Some(record)
    }

    /// Overwrite the stored record.
    pub fn save(&self, record: &PersistedRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        self.store.set(&self.key, json)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(&self.key)
    }
}

/// Parse and validate a stored record; failures are logged and yield `None`.
fn parse_record(raw: &str) -> Option<PersistedRecord> {
    let record: PersistedRecord = match serde_json::from_str(raw) {
        Ok(record) => record,
        Err(e) => {
            log::warn!("Failed to parse saved state: {}", e);
            return None;
        }
    };
    if let Err(e) = record.validate() {
        log::warn!("Ignoring saved state: {}", e);
        return None;
    }
    Some(record)
}

/// Remove every record under `prefix` that is at least `ttl_ms` old (or unreadable).
/// Returns how many keys were removed.
pub fn purge_expired(store: &dyn KeyValueStore, prefix: &str, ttl_ms: i64, now_ms: i64) -> usize {
    let keys = match store.keys() {
        Ok(keys) => keys,
        Err(e) => {
            log::warn!("Failed to list saved states: {}", e);
            return 0;
        }
    };
    let mut removed = 0;
    for key in keys.iter().filter(|k| k.starts_with(prefix)) {
        let stale = match store.get(key) {
            Ok(Some(raw)) => parse_record(&raw).map_or(true, |r| r.age_ms(now_ms) >= ttl_ms),
            Ok(None) => false,
            Err(_) => false,
        };
        if stale && store.remove(key).is_ok() {
            removed += 1;
        }
    }
    removed
}
