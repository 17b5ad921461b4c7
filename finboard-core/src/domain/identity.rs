//! Identity and session models

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Represents an authenticated identity as issued by a session backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            created_at: Utc::now(),
        }
    }
}

/// Token pair plus the identity it was issued for.
///
/// A session is replaced wholesale on sign-in and sign-out, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub identity: Identity,
}

impl Session {
    /// Create a session that expires `lifetime_secs` from now
    pub fn issue(
        identity: Identity,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        lifetime_secs: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at: Utc::now() + Duration::seconds(lifetime_secs),
            identity,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// On-disk shape of a session: the identity and its tokens side by side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    pub user: Identity,
    pub session: PersistedTokens,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&Session> for PersistedSession {
    fn from(session: &Session) -> Self {
        Self {
            user: session.identity.clone(),
            session: PersistedTokens {
                access_token: session.access_token.clone(),
                refresh_token: session.refresh_token.clone(),
                expires_at: session.expires_at,
            },
        }
    }
}

impl From<PersistedSession> for Session {
    fn from(persisted: PersistedSession) -> Self {
        Self {
            access_token: persisted.session.access_token,
            refresh_token: persisted.session.refresh_token,
            expires_at: persisted.session.expires_at,
            identity: persisted.user,
        }
    }
}
