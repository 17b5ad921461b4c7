//! Fixed-credential session backend for local (offline) mode
//!
//! Accepts exactly one email/password pair and persists a mock session in the
//! key-value store so it survives restarts. No token is ever validated.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Identity, PersistedSession, Session};
use crate::ports::{KeyValueStore, SessionBackend};

/// Key-value entry holding the persisted local session
pub const LOCAL_SESSION_KEY: &str = "finboard.local_session";

/// The only email accepted in local mode
pub const TEST_EMAIL: &str = "test@example.com";

/// The only password accepted in local mode
pub const TEST_PASSWORD: &str = "password123";

/// Identity id every local session carries
pub const MOCK_USER_ID: &str = "test-user-id-12345";

pub const INVALID_TEST_CREDENTIALS: &str =
    "Invalid test credentials. Use test@example.com / password123";

const MOCK_SESSION_LIFETIME_SECS: i64 = 24 * 3600;

pub struct LocalSessionBackend {
    store: Arc<dyn KeyValueStore>,
}

impl LocalSessionBackend {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn mock_session(email: &str) -> Session {
        Session::issue(
            Identity::new(MOCK_USER_ID, email),
            format!("mock-access-{}", Uuid::new_v4()),
            format!("mock-refresh-{}", Uuid::new_v4()),
            MOCK_SESSION_LIFETIME_SECS,
        )
    }

    fn persist(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(&PersistedSession::from(session))?;
        self.store.set(LOCAL_SESSION_KEY, &json)
    }
}

#[async_trait]
impl SessionBackend for LocalSessionBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn restore(&self) -> Result<Option<Session>> {
        let Some(raw) = self.store.get(LOCAL_SESSION_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str::<PersistedSession>(&raw) {
            Ok(persisted) => Ok(Some(persisted.into())),
            Err(e) => {
                warn!(error = %e, "discarding unreadable local session");
                self.store.remove(LOCAL_SESSION_KEY)?;
                Ok(None)
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        if email != TEST_EMAIL || password != TEST_PASSWORD {
            return Err(Error::authentication(INVALID_TEST_CREDENTIALS));
        }

        let session = Self::mock_session(email);
        self.persist(&session)?;
        Ok(session)
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<Option<Session>> {
        let session = Self::mock_session(email);
        self.persist(&session)?;
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<()> {
        self.store.remove(LOCAL_SESSION_KEY)
    }
}
