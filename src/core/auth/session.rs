//! In-flight device-authorization sessions

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Upper bound on a session lifetime, whatever the provider reports
const MAX_SESSION_LIFETIME_SECS: u64 = 24 * 60 * 60;

/// Lifecycle state of a device-authorization session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Pending,
    Authorized,
    Denied,
    Expired,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionState::Pending)
    }
}

/// One device-flow grant in progress
#[derive(Debug, Clone)]
pub struct DeviceAuthorizationSession {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub expires_at: DateTime<Utc>,
    pub poll_interval_secs: u64,
    pub state: SessionState,
}

impl DeviceAuthorizationSession {
    pub fn new(
        device_code: String,
        user_code: String,
        verification_uri: String,
        expires_in_secs: u64,
        poll_interval_secs: u64,
    ) -> Self {
        let expires_in = expires_in_secs.min(MAX_SESSION_LIFETIME_SECS) as i64;
        let expires_at = Utc::now() + Duration::seconds(expires_in);
        Self {
            device_code,
            user_code,
            verification_uri,
            expires_at,
            poll_interval_secs,
            state: SessionState::Pending,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Result of a single status check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// User has not acted yet; poll again after `interval_secs`
    Pending { interval_secs: u64 },
    Authorized { access_token: String },
    Denied,
    Expired,
}

impl AuthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStatus::Pending { .. } => "pending",
            AuthStatus::Authorized { .. } => "authorized",
            AuthStatus::Denied => "denied",
            AuthStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AuthStatus::Pending { .. })
    }
}

impl std::fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sessions keyed by their opaque handle.
///
/// Expiry is passive: nothing runs in the background, callers drop expired
/// entries when they touch the table.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: RwLock<HashMap<String, DeviceAuthorizationSession>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, handle: String, session: DeviceAuthorizationSession) {
        self.sessions.write().await.insert(handle, session);
    }

    pub async fn get(&self, handle: &str) -> Option<DeviceAuthorizationSession> {
        self.sessions.read().await.get(handle).cloned()
    }

    /// Remove a session that reached a terminal state, recording that state
    pub async fn complete(
        &self,
        handle: &str,
        state: SessionState,
    ) -> Option<DeviceAuthorizationSession> {
        let mut session = self.sessions.write().await.remove(handle)?;
        session.state = state;
        Some(session)
    }

    /// Replace the poll interval of a live session
    pub async fn set_interval(&self, handle: &str, interval_secs: u64) {
        if let Some(session) = self.sessions.write().await.get_mut(handle) {
            session.poll_interval_secs = interval_secs;
        }
    }

    /// Drop every session whose expiry has passed. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
