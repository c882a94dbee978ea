//! Server-side session storage for the web front-end.
//!
//! A session caches the bearer token obtained at login plus a one-shot flash
//! message. Sessions are keyed by an opaque id carried in a cookie.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub token: Option<String>,
    /// Message consumed by the next product list render
    pub flash: Option<String>,
}

pub trait SessionStore: Send + Sync {
    /// Live session data, `None` when unknown or expired
    fn get(&self, id: &str) -> Option<SessionData>;

    /// Store `data` under `id`, replacing any previous value
    fn set(&self, id: &str, data: SessionData, ttl: Duration);

    /// Push a live session's expiry to `ttl` from now. Returns false when
    /// the session is unknown or already expired.
    fn touch(&self, id: &str, ttl: Duration) -> bool;

    fn clear(&self, id: &str);

    /// Drop expired sessions, returning how many were removed
    fn purge_expired(&self) -> usize;
}

struct SessionEntry {
    data: SessionData,
    expires_at: DateTime<Utc>,
}

/// Process-local session store
#[derive(Default)]
pub struct MemorySessionStore {
    entries: DashMap<String, SessionEntry>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn expires_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(id).map(|entry| entry.expires_at)
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, id: &str) -> Option<SessionData> {
        let now = Utc::now();
        {
            let entry = self.entries.get(id)?;
            if entry.expires_at > now {
                return Some(entry.data.clone());
            }
        }
        self.entries.remove_if(id, |_, entry| entry.expires_at <= now);
        None
    }

    fn set(&self, id: &str, data: SessionData, ttl: Duration) {
        self.entries.insert(
            id.to_string(),
            SessionEntry {
                data,
                expires_at: Utc::now() + ttl,
            },
        );
    }

    fn touch(&self, id: &str, ttl: Duration) -> bool {
        let now = Utc::now();
        match self.entries.get_mut(id) {
            Some(mut entry) if entry.expires_at > now => {
                entry.expires_at = now + ttl;
                true
            }
            _ => false,
        }
    }

    fn clear(&self, id: &str) {
        self.entries.remove(id);
    }

    fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}

/// Fresh random session id
pub fn new_session_id() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Spawn a background task that periodically purges expired sessions
pub fn spawn_cleanup_task(store: Arc<dyn SessionStore>, cleanup_interval_secs: u64) {
    tokio::spawn(async move {
        let interval = std::time::Duration::from_secs(cleanup_interval_secs.max(1));
        loop {
            tokio::time::sleep(interval).await;
            let removed = store.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, "Purged expired sessions");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_token(token: &str) -> SessionData {
        SessionData {
            token: Some(token.to_string()),
            flash: None,
        }
    }

    #[test]
    fn test_set_then_get() {
        let store = MemorySessionStore::new();
        store.set("s1", with_token("abc"), Duration::minutes(20));

        assert_eq!(store.get("s1"), Some(with_token("abc")));
        assert_eq!(store.get("other"), None);
    }

    #[test]
    fn test_set_replaces_previous_value() {
        let store = MemorySessionStore::new();
        store.set("s1", with_token("old"), Duration::minutes(20));
        store.set("s1", with_token("new"), Duration::minutes(20));

        assert_eq!(store.get("s1").unwrap().token.as_deref(), Some("new"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_expired_session_is_gone() {
        let store = MemorySessionStore::new();
        store.set("s1", with_token("abc"), Duration::seconds(-1));

        assert_eq!(store.get("s1"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_touch_extends_live_session() {
        let store = MemorySessionStore::new();
        store.set("s1", with_token("abc"), Duration::minutes(1));

        assert!(store.touch("s1", Duration::minutes(20)));
        assert!(store.expires_at("s1").unwrap() > Utc::now() + Duration::minutes(19));
        assert_eq!(store.get("s1"), Some(with_token("abc")));
    }

    #[test]
    fn test_touch_ignores_missing_and_expired() {
        let store = MemorySessionStore::new();
        store.set("dead", with_token("abc"), Duration::seconds(-1));

        assert!(!store.touch("dead", Duration::minutes(20)));
        assert!(!store.touch("unknown", Duration::minutes(20)));
        assert_eq!(store.get("dead"), None);
    }

    #[test]
    fn test_clear() {
        let store = MemorySessionStore::new();
        store.set("s1", with_token("abc"), Duration::minutes(20));
        store.clear("s1");

        assert_eq!(store.get("s1"), None);
    }

    #[test]
    fn test_purge_expired() {
        let store = MemorySessionStore::new();
        store.set("live", with_token("a"), Duration::minutes(20));
        store.set("dead1", with_token("b"), Duration::seconds(-5));
        store.set("dead2", with_token("c"), Duration::seconds(-5));

        assert_eq!(store.purge_expired(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.get("live").is_some());
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = new_session_id();
        let b = new_session_id();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
