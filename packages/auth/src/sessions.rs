//! Logged-in sessions, keyed by opaque bearer token.
//!
//! Sessions expire a fixed time after they are opened. Expired sessions
//! are removed when looked up and whenever a new session is opened.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};

/// Session lifetime used by [`SessionStore::default`].
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

/// One logged-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token.
    pub token: String,
    /// Authenticated username.
    pub username: String,
    /// When the session was opened.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is older than `ttl` at `now`.
    #[must_use]
    pub fn is_expired(&self, ttl: TimeDelta, now: DateTime<Utc>) -> bool {
        now - self.created_at >= ttl
    }
}

/// Open sessions.
#[derive(Debug)]
pub struct SessionStore {
    ttl: TimeDelta,
    sessions: Mutex<BTreeMap<String, Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(TimeDelta::hours(DEFAULT_SESSION_TTL_HOURS))
    }
}

impl SessionStore {
    /// An empty store whose sessions last `ttl`.
    #[must_use]
    pub fn with_ttl(ttl: TimeDelta) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(BTreeMap::new()),
        }
    }

    /// Opens a session for `username` with a fresh token, dropping any
    /// expired sessions.
    #[must_use]
    pub fn open(&self, username: &str) -> Session {
        let now = Utc::now();
        let session = Session {
            token: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            created_at: now,
        };

        let mut sessions = self.lock();
        sessions.retain(|_, s| !s.is_expired(self.ttl, now));
        sessions.insert(session.token.clone(), session.clone());
        session
    }

    /// Looks up the live session for `token`. An expired session is
    /// removed and treated as absent.
    #[must_use]
    pub fn get(&self, token: &str) -> Option<Session> {
        let mut sessions = self.lock();
        let session = sessions.get(token)?;
        if session.is_expired(self.ttl, Utc::now()) {
            log::debug!("Session for {} expired", session.username);
            sessions.remove(token);
            return None;
        }
        Some(session.clone())
    }

    /// Number of sessions held, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no sessions are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Closes the session for `token`. Returns whether one was open.
    pub fn close(&self, token: &str) -> bool {
        self.lock().remove(token).is_some()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
