//! Process-wide connection pool.
//!
//! Sessions are pooled by `(host, port, username, device-type)`. An entry
//! is handed to at most one caller at a time (the in-use flag), a second
//! live entry for a key is rejected, and a background reaper closes
//! entries idle longer than ten minutes. The map and flags live behind a
//! single synchronous lock; sessions are closed outside it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{debug, warn};
use once_cell::sync::Lazy;
use tokio::sync::Mutex as AsyncMutex;

use crate::credentials::Credentials;
use crate::error::PoolError;
use crate::session::DeviceSession;

/// How long an entry may sit unused before the reaper closes it.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// How often the reaper wakes up.
pub const REAP_INTERVAL: Duration = Duration::from_secs(60);

static GLOBAL_POOL: Lazy<Arc<ConnectionPool>> = Lazy::new(ConnectionPool::new);

type SharedSession = Arc<AsyncMutex<Box<dyn DeviceSession>>>;

/// Identity of a pooled session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub device_type: String,
}

impl PoolKey {
    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self {
            host: credentials.host.clone(),
            port: credentials.port,
            username: credentials.username.clone(),
            device_type: credentials.device_type.to_lowercase(),
        }
    }
}

impl std::fmt::Display for PoolKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}:{}/{}",
            self.username, self.host, self.port, self.device_type
        )
    }
}

struct PoolEntry {
    session: SharedSession,
    in_use: bool,
    last_used: Instant,
}

/// The pool itself. Use [`ConnectionPool::global`] for the process-wide
/// instance; tests construct their own.
pub struct ConnectionPool {
    entries: Mutex<HashMap<PoolKey, PoolEntry>>,
    reaper_started: AtomicBool,
}

impl ConnectionPool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
            reaper_started: AtomicBool::new(false),
        })
    }

    /// The process-wide pool.
    pub fn global() -> Arc<Self> {
        GLOBAL_POOL.clone()
    }

    /// Try to check out the session for `key`.
    ///
    /// Returns `Ok(None)` on a miss. A busy entry is an error only for an
    /// exclusive acquire; otherwise it is treated as a miss and the caller
    /// opens an unpooled session.
    pub fn acquire(
        self: &Arc<Self>,
        key: &PoolKey,
        exclusive: bool,
    ) -> std::result::Result<Option<PooledSession>, PoolError> {
        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries.get_mut(key) else {
            return Ok(None);
        };

        if entry.in_use {
            if exclusive {
                return Err(PoolError::Busy {
                    key: key.to_string(),
                });
            }
            debug!("pool entry {} busy, treating as miss", key);
            return Ok(None);
        }

        // The entry is free, so nothing holds the session lock; a failed
        // try_lock would mean the in-use flag lied.
        let healthy = match entry.session.try_lock() {
            Ok(session) => session.is_connected() && session.core().is_healthy(),
            Err(_) => false,
        };
        if !healthy {
            debug!("pool entry {} is dead, evicting", key);
            let entry = entries.remove(key).unwrap();
            drop(entries);
            Self::close_in_background(key.clone(), entry.session);
            return Ok(None);
        }

        entry.in_use = true;
        Ok(Some(PooledSession {
            key: key.clone(),
            session: entry.session.clone(),
            pool: self.clone(),
        }))
    }

    /// Insert a session for `key`, checked out to the caller.
    ///
    /// A live entry for the key is never replaced; the offered session is
    /// handed back so the caller can close it.
    pub fn insert(
        self: &Arc<Self>,
        key: PoolKey,
        session: Box<dyn DeviceSession>,
    ) -> std::result::Result<PooledSession, (PoolError, Box<dyn DeviceSession>)> {
        self.ensure_reaper();

        let mut entries = self.entries.lock().unwrap();
        if let Some(existing) = entries.get(&key) {
            let live = existing.in_use
                || match existing.session.try_lock() {
                    Ok(session) => session.is_connected() && session.core().is_healthy(),
                    Err(_) => true,
                };
            if live {
                return Err((
                    PoolError::DuplicateKey {
                        key: key.to_string(),
                    },
                    session,
                ));
            }
            let dead = entries.remove(&key).unwrap();
            Self::close_in_background(key.clone(), dead.session);
        }

        let shared: SharedSession = Arc::new(AsyncMutex::new(session));
        entries.insert(
            key.clone(),
            PoolEntry {
                session: shared.clone(),
                in_use: true,
                last_used: Instant::now(),
            },
        );
        debug!("pooled session inserted for {}", key);

        Ok(PooledSession {
            key,
            session: shared,
            pool: self.clone(),
        })
    }

    /// Return a checked-out session to the pool.
    fn release(&self, key: &PoolKey) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(key) {
            entry.in_use = false;
            entry.last_used = Instant::now();
        }
    }

    /// Drop an entry (cancelled or unhealthy session) and close it.
    pub fn remove(&self, key: &PoolKey) {
        let removed = {
            let mut entries = self.entries.lock().unwrap();
            entries.remove(key)
        };
        if let Some(entry) = removed {
            Self::close_in_background(key.clone(), entry.session);
        }
    }

    /// Close entries idle longer than [`IDLE_TIMEOUT`].
    pub fn reap(&self) {
        self.reap_idle_longer_than(IDLE_TIMEOUT);
    }

    /// Reap with an explicit idle threshold.
    ///
    /// Expired entries are collected under the lock and closed after it is
    /// released.
    pub fn reap_idle_longer_than(&self, idle: Duration) {
        let expired: Vec<(PoolKey, SharedSession)> = {
            let mut entries = self.entries.lock().unwrap();
            let keys: Vec<PoolKey> = entries
                .iter()
                .filter(|(_, e)| !e.in_use && e.last_used.elapsed() >= idle)
                .map(|(k, _)| k.clone())
                .collect();
            keys.into_iter()
                .map(|k| {
                    let entry = entries.remove(&k).unwrap();
                    (k, entry.session)
                })
                .collect()
        };

        for (key, session) in expired {
            debug!("reaping idle pooled session for {}", key);
            Self::close_in_background(key, session);
        }
    }

    /// Close every entry, waiting for each disconnect.
    pub async fn force_cleanup(&self) {
        let drained: Vec<(PoolKey, SharedSession)> = {
            let mut entries = self.entries.lock().unwrap();
            entries.drain().map(|(k, e)| (k, e.session)).collect()
        };

        for (key, session) in drained {
            let mut session = session.lock().await;
            if let Err(e) = session.disconnect().await {
                warn!("closing pooled session {} failed: {}", key, e);
            }
        }
    }

    /// Number of entries currently in the pool.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an entry exists for `key`.
    pub fn contains(&self, key: &PoolKey) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    /// Spawn the periodic reaper once.
    fn ensure_reaper(self: &Arc<Self>) {
        if tokio::runtime::Handle::try_current().is_err() {
            return;
        }
        if self.reaper_started.swap(true, Ordering::SeqCst) {
            return;
        }
        let pool = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(REAP_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(pool) = pool.upgrade() else {
                    return;
                };
                pool.reap();
            }
        });
    }

    /// Disconnect a session on a background task, outside any pool lock.
    fn close_in_background(key: PoolKey, session: SharedSession) {
        if tokio::runtime::Handle::try_current().is_err() {
            // No runtime (synchronous teardown): dropping the session
            // closes the transport with it.
            return;
        }
        tokio::spawn(async move {
            let mut session = session.lock().await;
            if let Err(e) = session.disconnect().await {
                debug!("closing pooled session {} failed: {}", key, e);
            }
        });
    }
}

/// A session checked out of the pool.
///
/// Dropping the guard returns the entry to the pool and refreshes its
/// idle timestamp.
pub struct PooledSession {
    key: PoolKey,
    session: SharedSession,
    pool: Arc<ConnectionPool>,
}

impl PooledSession {
    pub fn key(&self) -> &PoolKey {
        &self.key
    }

    /// The shared session handle.
    pub fn session(&self) -> &SharedSession {
        &self.session
    }
}

impl Drop for PooledSession {
    fn drop(&mut self) {
        self.pool.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::AdvancedOptions;
    use crate::vendors::GenericSession;

    fn key(host: &str) -> PoolKey {
        PoolKey {
            host: host.to_string(),
            port: 22,
            username: "admin".to_string(),
            device_type: "generic".to_string(),
        }
    }

    fn session(host: &str) -> Box<dyn DeviceSession> {
        Box::new(GenericSession::new(
            Credentials::password_login(host, "admin", "pw", "generic"),
            AdvancedOptions::default(),
        ))
    }

    #[tokio::test]
    async fn test_acquire_miss_on_empty_pool() {
        let pool = ConnectionPool::new();
        assert!(pool.acquire(&key("h1"), false).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_live_key() {
        let pool = ConnectionPool::new();
        let _guard = pool.insert(key("h1"), session("h1")).ok().unwrap();
        // The first entry is checked out, so it is live by definition.
        let result = pool.insert(key("h1"), session("h1"));
        assert!(matches!(result, Err((PoolError::DuplicateKey { .. }, _))));
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_keep_one_live_entry() {
        let pool = ConnectionPool::new();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            // Winners keep their guard so the entry stays visibly live
            // while the other inserts race.
            handles.push(tokio::spawn(async move {
                pool.insert(key("h1"), session("h1")).ok()
            }));
        }

        let mut winners = Vec::new();
        for handle in handles {
            if let Some(guard) = handle.await.unwrap() {
                winners.push(guard);
            }
        }
        assert_eq!(winners.len(), 1, "exactly one insert may win");
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn test_busy_entry_is_miss_unless_exclusive() {
        let pool = ConnectionPool::new();
        let guard = pool.insert(key("h1"), session("h1")).ok().unwrap();

        // Non-exclusive: miss
        assert!(pool.acquire(&key("h1"), false).unwrap().is_none());
        // Exclusive: busy error
        assert!(matches!(
            pool.acquire(&key("h1"), true),
            Err(PoolError::Busy { .. })
        ));

        drop(guard);
        // Released entries are disconnected mock-less sessions, so the
        // health check evicts them rather than handing them out.
        assert!(pool.acquire(&key("h1"), false).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_release_refreshes_and_clears_in_use() {
        let pool = ConnectionPool::new();
        let guard = pool.insert(key("h1"), session("h1")).ok().unwrap();
        drop(guard);
        // In-use flag cleared: an exclusive acquire no longer reports busy.
        assert!(!matches!(
            pool.acquire(&key("h1"), true),
            Err(PoolError::Busy { .. })
        ));
    }

    #[tokio::test]
    async fn test_reap_closes_idle_entries() {
        let pool = ConnectionPool::new();
        let guard = pool.insert(key("h1"), session("h1")).ok().unwrap();
        drop(guard);
        assert_eq!(pool.len(), 1);

        // Nothing is older than ten minutes yet.
        pool.reap();
        assert_eq!(pool.len(), 1);

        // With a zero threshold the entry expires immediately.
        pool.reap_idle_longer_than(Duration::ZERO);
        assert_eq!(pool.len(), 0);
    }

    #[tokio::test]
    async fn test_reap_skips_in_use_entries() {
        let pool = ConnectionPool::new();
        let _guard = pool.insert(key("h1"), session("h1")).ok().unwrap();
        pool.reap_idle_longer_than(Duration::ZERO);
        assert_eq!(pool.len(), 1, "checked-out entries must survive the reaper");
    }

    #[tokio::test]
    async fn test_force_cleanup_empties_the_pool() {
        let pool = ConnectionPool::new();
        drop(pool.insert(key("h1"), session("h1")).ok().unwrap());
        drop(pool.insert(key("h2"), session("h2")).ok().unwrap());
        assert_eq!(pool.len(), 2);

        pool.force_cleanup().await;
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_remove_evicts_entry() {
        let pool = ConnectionPool::new();
        drop(pool.insert(key("h1"), session("h1")).ok().unwrap());
        pool.remove(&key("h1"));
        assert!(!pool.contains(&key("h1")));
    }

    #[test]
    fn test_pool_key_display() {
        assert_eq!(key("h1").to_string(), "admin@h1:22/generic");
    }
}
