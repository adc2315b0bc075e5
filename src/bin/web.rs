//! Single binary web server: HTML from templates/, static from /static, API via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST, PORT. STATE_DIR keeps match records on disk (in memory otherwise).
//! NEXT_SET_SERVER=set_loser makes the loser of a set serve first in the next one.
//! SESSION_KEY (32+ bytes) signs the session cookie; without it the key is kept in
//! STATE_DIR/session.key, or generated per process when there is no STATE_DIR.

use actix_files::Files;
use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
use actix_web::{
    cookie::Key,
    get, post, put,
    web::{self, Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use badminton_scoreboard_web::{
    load_or_create_secret, now_ms, purge_expired, Command, Confirmation, CourtSide, FileStore, KeyValueStore, MatchError,
    MatchSession, MatchStore, MatchView, MemoryStore, NextSetServer, Notice, NoticeBuffer, Team,
    UndoOutcome, RECORD_TTL_MS, STORAGE_KEY,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Identifier of a hosted match.
type MatchId = Uuid;

/// Per-match entry: the live session, its pending notices, last activity (for auto-cleanup).
struct MatchEntry {
    session: MatchSession,
    notices: Arc<NoticeBuffer>,
    last_activity: Instant,
}

/// In-memory matches by id plus the store their records are saved in.
struct Scoreboards {
    matches: RwLock<HashMap<MatchId, MatchEntry>>,
    store: Arc<dyn KeyValueStore>,
    next_set_server: NextSetServer,
}

type AppState = Data<Scoreboards>;

/// Matches idle for this long are dropped (same as the record time-to-live).
const INACTIVITY_TIMEOUT: Duration = Duration::from_millis(RECORD_TTL_MS as u64);

/// Cookie session key holding the browser's current match id.
const SESSION_MATCH_KEY: &str = "match_id";

fn record_key(id: MatchId) -> String {
    format!("{}:{}", STORAGE_KEY, id)
}

fn key_prefix() -> String {
    format!("{}:", STORAGE_KEY)
}

impl Scoreboards {
    fn match_store(&self, id: MatchId) -> MatchStore {
        MatchStore::with_key(self.store.clone(), record_key(id))
    }

    fn new_entry(&self, id: MatchId, is_doubles: bool) -> MatchEntry {
        let notices = Arc::new(NoticeBuffer::new());
        let session = MatchSession::start(self.match_store(id), notices.clone(), is_doubles)
            .with_next_set_server(self.next_set_server);
        MatchEntry {
            session,
            notices,
            last_activity: Instant::now(),
        }
    }

    /// Bring a match back from the store after a restart, if its record is still fresh.
    fn restore_entry(&self, id: MatchId) -> Option<MatchEntry> {
        let store = self.match_store(id);
        let record = store.load()?;
        let notices = Arc::new(NoticeBuffer::new());
        let session = MatchSession::from_record(store, record, notices.clone())
            .with_next_set_server(self.next_set_server);
        log::info!("Restored match {} from saved state", id);
        Some(MatchEntry {
            session,
            notices,
            last_activity: Instant::now(),
        })
    }
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

/// What every match endpoint returns.
#[derive(Serialize)]
struct MatchResponse {
    id: MatchId,
    view: MatchView,
    /// Dialog the client should show; on confirm it posts the command to `/confirm`.
    confirmation: Option<Confirmation>,
    /// Only set by the undo endpoint: false means there was nothing to undo.
    #[serde(skip_serializing_if = "Option::is_none")]
    undone: Option<bool>,
    notices: Vec<Notice>,
}

/// Outcome of a match action, before the view is attached.
#[derive(Default)]
struct Reply {
    confirmation: Option<Confirmation>,
    undone: Option<bool>,
}

impl From<Option<Confirmation>> for Reply {
    fn from(confirmation: Option<Confirmation>) -> Self {
        Self {
            confirmation,
            undone: None,
        }
    }
}

#[derive(Deserialize)]
struct CreateMatchBody {
    #[serde(default = "default_doubles")]
    doubles: bool,
}

fn default_doubles() -> bool {
    true
}

#[derive(Deserialize)]
struct TeamBody {
    team: Team,
}

#[derive(Deserialize)]
struct RenameBody {
    team: Team,
    side: CourtSide,
    name: String,
}

#[derive(Deserialize)]
struct ConfirmBody {
    command: Command,
}

/// Path segment: match id (e.g. /api/matches/{id})
#[derive(Deserialize)]
struct MatchPath {
    id: MatchId,
}

fn error_response(e: &MatchError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        MatchError::MatchNotFound => HttpResponse::NotFound().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn respond(id: MatchId, entry: &MatchEntry, reply: Reply) -> HttpResponse {
    HttpResponse::Ok().json(MatchResponse {
        id,
        view: entry.session.view(),
        confirmation: reply.confirmation,
        undone: reply.undone,
        notices: entry.notices.drain(),
    })
}

/// Look up (or restore) a match, refresh its activity time, and apply `action` under the write lock.
fn with_match<F>(state: &AppState, id: MatchId, action: F) -> HttpResponse
where
    F: FnOnce(&mut MatchSession) -> Result<Reply, MatchError>,
{
    let mut g = match state.matches.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    if !g.contains_key(&id) {
        match state.restore_entry(id) {
            Some(entry) => {
                g.insert(id, entry);
            }
            None => return error_response(&MatchError::MatchNotFound),
        }
    }
    let entry = match g.get_mut(&id) {
        Some(e) => e,
        None => return error_response(&MatchError::MatchNotFound),
    };
    entry.last_activity = Instant::now();
    match action(&mut entry.session) {
        Ok(reply) => respond(id, entry, reply),
        Err(e) => error_response(&e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "badminton-scoreboard-web",
    })
}

#[get("/api/hello")]
async fn api_hello() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "message": "Hello from the scoreboard backend!" }))
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Create a new match (returns it with id; the id is also remembered in the cookie session).
#[post("/api/matches")]
async fn api_create_match(
    state: AppState,
    session: Session,
    body: Option<Json<CreateMatchBody>>,
) -> HttpResponse {
    let is_doubles = body.as_ref().map(|b| b.doubles).unwrap_or_else(default_doubles);
    let id = Uuid::new_v4();
    let entry = state.new_entry(id, is_doubles);
    if let Err(e) = session.insert(SESSION_MATCH_KEY, id) {
        log::warn!("Failed to remember match {} in session: {}", id, e);
    }
    let mut g = match state.matches.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = g.entry(id).or_insert(entry);
    log::info!("Created match {}", id);
    respond(id, entry, Reply::default())
}

/// The match remembered for this browser (404 if none or expired).
#[get("/api/matches/current")]
async fn api_current_match(state: AppState, session: Session) -> HttpResponse {
    match session.get::<MatchId>(SESSION_MATCH_KEY) {
        Ok(Some(id)) => with_match(&state, id, |_| Ok(Reply::default())),
        Ok(None) => error_response(&MatchError::MatchNotFound),
        Err(e) => {
            log::warn!("Unreadable session cookie: {}", e);
            session.remove(SESSION_MATCH_KEY);
            error_response(&MatchError::MatchNotFound)
        }
    }
}

/// Get a match by id (404 if not found). Touching it refreshes last_activity.
#[get("/api/matches/{id}")]
async fn api_get_match(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    with_match(&state, path.id, |_| Ok(Reply::default()))
}

/// Award a rally to a team. A decided set comes back as a confirmation.
#[post("/api/matches/{id}/points")]
async fn api_point(state: AppState, path: Path<MatchPath>, body: Json<TeamBody>) -> HttpResponse {
    with_match(&state, path.id, |s| Ok(s.point(body.team).into()))
}

/// Undo the last rally. `undone: false` when the history was empty.
#[post("/api/matches/{id}/undo")]
async fn api_undo(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    with_match(&state, path.id, |s| {
        let undone = matches!(s.undo(), UndoOutcome::Restored(_));
        Ok(Reply {
            confirmation: None,
            undone: Some(undone),
        })
    })
}

/// Credit the decided set (400 if the score does not give the team the set).
#[post("/api/matches/{id}/sets/complete")]
async fn api_complete_set(state: AppState, path: Path<MatchPath>, body: Json<TeamBody>) -> HttpResponse {
    with_match(&state, path.id, |s| s.complete_set(body.team).map(Reply::from))
}

/// Switch singles/doubles; asks for confirmation while rallies are recorded.
#[post("/api/matches/{id}/mode")]
async fn api_toggle_mode(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    with_match(&state, path.id, |s| Ok(s.request(Command::ToggleMode).into()))
}

/// Ask to reset the match (always answered with a confirmation).
#[post("/api/matches/{id}/reset")]
async fn api_reset(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    with_match(&state, path.id, |s| Ok(s.request(Command::Reset).into()))
}

/// Run a command the user confirmed.
#[post("/api/matches/{id}/confirm")]
async fn api_confirm(state: AppState, path: Path<MatchPath>, body: Json<ConfirmBody>) -> HttpResponse {
    with_match(&state, path.id, |s| match body.command {
        Command::CompleteSet { team } => s.complete_set(team).map(Reply::from),
        command => Ok(s.run(command).into()),
    })
}

/// Rename the player on one side of a team (blank restores the seat code).
#[put("/api/matches/{id}/players")]
async fn api_rename_player(state: AppState, path: Path<MatchPath>, body: Json<RenameBody>) -> HttpResponse {
    with_match(&state, path.id, |s| {
        s.rename(body.team, body.side, &body.name);
        Ok(Reply::default())
    })
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn open_store() -> Arc<dyn KeyValueStore> {
    match std::env::var("STATE_DIR") {
        Ok(dir) if !dir.trim().is_empty() => match FileStore::open(dir.trim()) {
            Ok(store) => {
                log::info!("Saving match records in {}", store.dir().display());
                Arc::new(store)
            }
            Err(e) => {
                log::warn!("Cannot use STATE_DIR {}: {}; keeping records in memory", dir, e);
                Arc::new(MemoryStore::new())
            }
        },
        _ => Arc::new(MemoryStore::new()),
    }
}

/// Cookie key that survives restarts when SESSION_KEY or STATE_DIR is set.
fn load_session_key() -> Key {
    if let Ok(secret) = std::env::var("SESSION_KEY") {
        if secret.len() >= 32 {
            return Key::derive_from(secret.as_bytes());
        }
        log::warn!("SESSION_KEY shorter than 32 bytes; ignoring it");
    }
    if let Ok(dir) = std::env::var("STATE_DIR") {
        let path = std::path::Path::new(dir.trim()).join("session.key");
        let secret = load_or_create_secret(&path, 64, || Key::generate().master().to_vec());
        match secret.map(|bytes| Key::try_from(bytes.as_slice())) {
            Ok(Ok(key)) => return key,
            Ok(Err(e)) => log::warn!("Unusable session key in {}: {}", path.display(), e),
            Err(e) => log::warn!("Cannot keep session key in {}: {}", path.display(), e),
        }
    }
    log::info!("Using a per-process session key; match cookies end with this process");
    Key::generate()
}

fn next_set_server_from_env() -> NextSetServer {
    match std::env::var("NEXT_SET_SERVER").as_deref() {
        Ok("set_loser") => NextSetServer::SetLoser,
        _ => NextSetServer::KeepLast,
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(Scoreboards {
        matches: RwLock::new(HashMap::new()),
        store: open_store(),
        next_set_server: next_set_server_from_env(),
    });
    let session_key = load_session_key();

    // Background task: every 10 minutes, drop idle matches and stale records
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(10 * 60));
        loop {
            interval.tick().await;
            {
                let mut g = match state_cleanup.matches.write() {
                    Ok(guard) => guard,
                    Err(_) => continue,
                };
                let before = g.len();
                g.retain(|_, entry| entry.last_activity.elapsed() < INACTIVITY_TIMEOUT);
                let removed = before - g.len();
                if removed > 0 {
                    log::info!("Cleaned up {} idle match(es)", removed);
                }
            }
            let purged = purge_expired(
                state_cleanup.store.as_ref(),
                &key_prefix(),
                RECORD_TTL_MS,
                now_ms(),
            );
            if purged > 0 {
                log::info!("Purged {} stale match record(s)", purged);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .route("/", web::get().to(serve_index_async))
            .service(api_health)
            .service(api_hello)
            .service(favicon)
            .service(api_create_match)
            .service(api_current_match)
            .service(api_get_match)
            .service(api_point)
            .service(api_undo)
            .service(api_complete_set)
            .service(api_toggle_mode)
            .service(api_reset)
            .service(api_confirm)
            .service(api_rename_player)
            .service(Files::new("/static", "static"))
    })
    .bind(bind)?
    .run()
    .await
}

async fn serve_index_async() -> HttpResponse {
    let html = include_str!("../../templates/index.html");
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}
