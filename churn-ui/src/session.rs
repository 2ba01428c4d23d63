//! Per-user session store
//!
//! Each browser session is identified by the `churn_session` cookie and owns
//! one [`SessionContext`]. Contexts are independent; the lock only guards the
//! map itself. Stored tables are shared as `Arc` so handlers can render
//! without holding the lock.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderName},
};
use churn_common::dataset::UploadedTable;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::AppState;

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "churn_session";

/// State owned by one session
#[derive(Debug)]
pub struct SessionContext {
    /// Most recent upload; replaced wholesale by the next one
    pub dataset: Option<Arc<UploadedTable>>,
    /// Milliseconds since the store's epoch; touched under the read lock
    last_seen: AtomicU64,
}

impl SessionContext {
    fn new(now: u64) -> Self {
        Self {
            dataset: None,
            last_seen: AtomicU64::new(now),
        }
    }

    fn touch(&self, now: u64) {
        self.last_seen.fetch_max(now, Ordering::Relaxed);
    }

    fn idle_for(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_seen.load(Ordering::Relaxed))
    }
}

/// Map of live sessions with lazy idle eviction
///
/// Known sessions resolve under the read lock. Expired entries are swept at
/// most once per sweep interval, so steady traffic does not serialize on the
/// write lock.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionContext>>>,
    epoch: Instant,
    idle_timeout: u64,
    sweep_interval: u64,
    last_sweep: Arc<AtomicU64>,
}

/// Upper bound on the time between two sweeps
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            epoch: Instant::now(),
            idle_timeout: millis(idle_timeout),
            sweep_interval: millis(idle_timeout.min(MAX_SWEEP_INTERVAL)),
            last_sweep: Arc::new(AtomicU64::new(0)),
        }
    }

    fn now(&self) -> u64 {
        millis(self.epoch.elapsed())
    }

    fn is_expired(&self, ctx: &SessionContext, now: u64) -> bool {
        ctx.idle_for(now) > self.idle_timeout
    }

    /// Session for a request, creating one when the cookie is missing,
    /// malformed, unknown or expired
    pub async fn resolve(&self, headers: &HeaderMap) -> Uuid {
        let now = self.now();
        let cookie_id = session_id_from_headers(headers);

        if let Some(id) = cookie_id {
            let live = match self.sessions.read().await.get(&id) {
                Some(ctx) if !self.is_expired(ctx, now) => {
                    ctx.touch(now);
                    true
                }
                _ => false,
            };
            if live {
                self.sweep_if_due(now).await;
                return id;
            }
        }

        let mut sessions = self.sessions.write().await;
        if self.claim_sweep(now) {
            self.evict_idle(&mut sessions, now);
        }
        if let Some(id) = cookie_id {
            if let Some(ctx) = sessions.get(&id) {
                if !self.is_expired(ctx, now) {
                    ctx.touch(now);
                    return id;
                }
                sessions.remove(&id);
            }
        }

        let id = Uuid::new_v4();
        sessions.insert(id, SessionContext::new(now));
        debug!("Started session {}", id);
        id
    }

    /// Sweep expired sessions if the interval since the last sweep elapsed
    async fn sweep_if_due(&self, now: u64) {
        if self.claim_sweep(now) {
            let mut sessions = self.sessions.write().await;
            self.evict_idle(&mut sessions, now);
        }
    }

    /// True for exactly one caller per sweep interval
    fn claim_sweep(&self, now: u64) -> bool {
        let last = self.last_sweep.load(Ordering::Relaxed);
        now.saturating_sub(last) >= self.sweep_interval
            && self
                .last_sweep
                .compare_exchange(last, now, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, SessionContext>, now: u64) {
        let before = sessions.len();
        sessions.retain(|_, ctx| !self.is_expired(ctx, now));
        if sessions.len() < before {
            debug!("Evicted {} idle sessions", before - sessions.len());
        }
    }

    /// The session's stored dataset, if any
    pub async fn dataset(&self, id: Uuid) -> Option<Arc<UploadedTable>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .and_then(|ctx| ctx.dataset.clone())
    }

    /// Store `table`, replacing any earlier upload of the session
    pub async fn store_dataset(&self, id: Uuid, table: UploadedTable) -> Arc<UploadedTable> {
        let table = Arc::new(table);
        let mut sessions = self.sessions.write().await;
        let now = self.now();
        let ctx = sessions.entry(id).or_insert_with(|| SessionContext::new(now));
        ctx.dataset = Some(Arc::clone(&table));
        ctx.touch(now);
        table
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Parse the session id out of the `Cookie` headers
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// Session resolved for the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session(pub Uuid);

impl Session {
    pub fn id(&self) -> Uuid {
        self.0
    }

    /// `Set-Cookie` header to attach to the response
    pub fn set_cookie(&self) -> [(HeaderName, String); 1] {
        [(
            header::SET_COOKIE,
            format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, self.0),
        )]
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Session(state.sessions.resolve(&parts.headers).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn table(csv: &str) -> UploadedTable {
        UploadedTable::from_csv_bytes(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_cookie_parsing() {
        let id = Uuid::new_v4();
        let headers = cookie_headers(&format!("theme=light; {}={}; other=1", SESSION_COOKIE, id));
        assert_eq!(session_id_from_headers(&headers), Some(id));

        assert_eq!(session_id_from_headers(&cookie_headers("churn_session=garbage")), None);
        assert_eq!(session_id_from_headers(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_resolve_reuses_known_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.resolve(&HeaderMap::new()).await;

        let headers = cookie_headers(&format!("{}={}", SESSION_COOKIE, id));
        assert_eq!(store.resolve(&headers).await, id);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_starts_new_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let stale = Uuid::new_v4();
        let headers = cookie_headers(&format!("{}={}", SESSION_COOKIE, stale));
        assert_ne!(store.resolve(&headers).await, stale);
    }

    #[tokio::test]
    async fn test_upload_replaces_previous_table() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.resolve(&HeaderMap::new()).await;

        store.store_dataset(id, table("a,b\n1,2\n")).await;
        store.store_dataset(id, table("c\n3\n")).await;

        let stored = store.dataset(id).await.unwrap();
        assert_eq!(stored.columns(), &["c"]);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new(Duration::from_secs(60));
        let alice = store.resolve(&HeaderMap::new()).await;
        let bob = store.resolve(&HeaderMap::new()).await;

        store.store_dataset(alice, table("a\n1\n")).await;
        assert!(store.dataset(alice).await.is_some());
        assert!(store.dataset(bob).await.is_none());
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let store = SessionStore::new(Duration::from_millis(20));
        let id = store.resolve(&HeaderMap::new()).await;
        store.store_dataset(id, table("a\n1\n")).await;

        tokio::time::sleep(Duration::from_millis(50)).await;

        let headers = cookie_headers(&format!("{}={}", SESSION_COOKIE, id));
        let next = store.resolve(&headers).await;
        assert_ne!(next, id);
        assert!(store.dataset(id).await.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_known_session_does_not_grow_store() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.resolve(&HeaderMap::new()).await;
        let headers = cookie_headers(&format!("{}={}", SESSION_COOKIE, id));

        for _ in 0..10 {
            assert_eq!(store.resolve(&headers).await, id);
        }
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_sweep_runs_once_per_interval() {
        let store = SessionStore::new(Duration::from_secs(3600));
        assert_eq!(store.sweep_interval, 60_000);

        assert!(!store.claim_sweep(59_999));
        assert!(store.claim_sweep(60_000));
        assert!(!store.claim_sweep(60_001));
        assert!(!store.claim_sweep(119_999));
        assert!(store.claim_sweep(120_000));
    }

    #[tokio::test]
    async fn test_expired_cookie_is_not_reused_between_sweeps() {
        let store = SessionStore::new(Duration::from_millis(20));
        let id = store.resolve(&HeaderMap::new()).await;
        store.resolve(&HeaderMap::new()).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        store.last_sweep.store(store.now(), Ordering::Relaxed);

        let headers = cookie_headers(&format!("{}={}", SESSION_COOKIE, id));
        let next = store.resolve(&headers).await;
        assert_ne!(next, id);
        // Only the presented id is dropped; the rest waits for the next sweep
        assert_eq!(store.len().await, 2);
    }
}
