//! Session backend port - where identities and tokens come from

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::Session;

/// Issues, restores and revokes sessions.
///
/// There are two implementations: one delegating to the remote auth service
/// and one accepting a single fixed credential for local (offline) use. The
/// backend is chosen once when the context is built.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Backend name (e.g., "remote", "local")
    fn name(&self) -> &str;

    /// Restore the persisted session, if any.
    ///
    /// Returns `Ok(None)` when nothing is persisted or the persisted session
    /// can no longer be used.
    async fn restore(&self) -> Result<Option<Session>>;

    /// Exchange credentials for a session.
    ///
    /// Rejected credentials fail with `Error::Authentication` and leave any
    /// persisted state untouched.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Register a new identity.
    ///
    /// `Ok(None)` means the account was created but no session was issued
    /// (for example, email confirmation is pending).
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>>;

    /// Revoke the current session and forget any persisted copy
    async fn sign_out(&self) -> Result<()>;
}
