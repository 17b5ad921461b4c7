//! Auth context provider
//!
//! Owns the current identity and its privileges and broadcasts every change
//! through a `watch` channel. Guard, navigation and page services read from
//! here instead of talking to the session backend themselves.
//!
//! Whenever the identity becomes `Some`, its privileges are resolved before
//! the state carrying it is published, so a subscriber never observes an
//! identity without privileges once loading is over.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{Identity, PrivilegeSet, Session};
use crate::ports::SessionBackend;
use crate::services::privilege::{PrivilegeResolution, PrivilegeResolver, PrivilegeSource};

/// Lifecycle of the auth context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthPhase {
    /// `initialize` has not been called yet
    Uninitialized,
    /// Restoring a persisted session
    Resolving,
    Ready,
}

/// Snapshot published to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub phase: AuthPhase,
    pub identity: Option<Identity>,
    pub privileges: Option<PrivilegeSet>,
    pub privilege_source: Option<PrivilegeSource>,
    pub loading: bool,
}

impl AuthState {
    fn uninitialized() -> Self {
        Self {
            phase: AuthPhase::Uninitialized,
            identity: None,
            privileges: None,
            privilege_source: None,
            loading: true,
        }
    }

    fn resolving() -> Self {
        Self {
            phase: AuthPhase::Resolving,
            ..Self::uninitialized()
        }
    }

    fn anonymous() -> Self {
        Self {
            phase: AuthPhase::Ready,
            identity: None,
            privileges: None,
            privilege_source: None,
            loading: false,
        }
    }

    fn signed_in(identity: Identity, resolution: PrivilegeResolution) -> Self {
        Self {
            phase: AuthPhase::Ready,
            identity: Some(identity),
            privileges: Some(resolution.privileges),
            privilege_source: Some(resolution.source),
            loading: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// Result of a sign-up request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// A session was issued and is now current
    SignedIn(Identity),
    /// The account exists but must be confirmed before signing in
    ConfirmationPending,
}

pub struct AuthService {
    backend: Arc<dyn SessionBackend>,
    resolver: PrivilegeResolver,
    state: watch::Sender<AuthState>,
    /// Bumped whenever a new identity (or none) is about to be published;
    /// results computed under an older generation are dropped.
    generation: AtomicU64,
    /// Generation of the most recent sign-out
    signed_out_at: AtomicU64,
}

impl AuthService {
    pub fn new(backend: Arc<dyn SessionBackend>, resolver: PrivilegeResolver) -> Self {
        let (state, _) = watch::channel(AuthState::uninitialized());
        Self {
            backend,
            resolver,
            state,
            generation: AtomicU64::new(0),
            signed_out_at: AtomicU64::new(0),
        }
    }

    /// Name of the session backend ("remote" or "local")
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Current snapshot
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Current identity, or an authentication error when signed out
    pub fn require_identity(&self) -> Result<Identity> {
        self.state
            .borrow()
            .identity
            .clone()
            .ok_or_else(|| Error::authentication("Not signed in"))
    }

    /// Session bootstrap: restore the persisted session, resolve its
    /// privileges, then publish `Ready` once.
    ///
    /// A failed restore still ends in `Ready` (signed out); the error is
    /// returned so the caller can report it.
    pub async fn initialize(&self) -> Result<Option<Identity>> {
        let generation = self.next_generation();
        self.state.send_replace(AuthState::resolving());

        match self.backend.restore().await {
            Ok(Some(session)) => {
                let identity = session.identity;
                let resolution = self.resolver.resolve(&identity.id).await;
                self.publish(generation, AuthState::signed_in(identity.clone(), resolution));
                Ok(Some(identity))
            }
            Ok(None) => {
                self.publish(generation, AuthState::anonymous());
                Ok(None)
            }
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "session restore failed");
                self.publish(generation, AuthState::anonymous());
                Err(e)
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// On failure nothing changes: the previous state stays published. A
    /// sign-in overtaken by a sign-out (or another sign-in) while in flight
    /// fails too, and its fresh session is discarded.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let started = self.generation.load(Ordering::SeqCst);
        let session = self.backend.sign_in(email, password).await?;
        let identity = self.adopt(started, session).await?;
        info!(backend = self.backend.name(), "signed in");
        Ok(identity)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let started = self.generation.load(Ordering::SeqCst);
        match self.backend.sign_up(email, password).await? {
            Some(session) => {
                let identity = self.adopt(started, session).await?;
                info!(backend = self.backend.name(), "signed up");
                Ok(SignUpOutcome::SignedIn(identity))
            }
            None => Ok(SignUpOutcome::ConfirmationPending),
        }
    }

    /// Clear the current identity and revoke the session.
    ///
    /// Idempotent. Backend failures are logged, never returned.
    pub async fn sign_out(&self) {
        let generation = self.next_generation();
        self.signed_out_at.store(generation, Ordering::SeqCst);
        self.state.send_replace(AuthState::anonymous());

        if let Err(e) = self.backend.sign_out().await {
            warn!(backend = self.backend.name(), error = %e, "sign-out failed on backend");
        } else {
            info!(backend = self.backend.name(), "signed out");
        }
    }

    /// Re-resolve privileges for the current identity. No-op when signed out.
    pub async fn refresh_privileges(&self) -> Option<PrivilegeResolution> {
        let identity = self.state.borrow().identity.clone()?;
        let resolution = self.resolver.resolve(&identity.id).await;

        let privileges = resolution.privileges;
        let source = resolution.source;
        self.state.send_if_modified(|state| {
            // Identity changed while resolving: the result belongs to nobody
            if state.identity.as_ref().map(|i| i.id.as_str()) != Some(identity.id.as_str()) {
                return false;
            }
            let changed =
                state.privileges != Some(privileges) || state.privilege_source != Some(source);
            state.privileges = Some(privileges);
            state.privilege_source = Some(source);
            changed
        });

        Some(resolution)
    }

    /// Publish a fresh session, unless another operation started after
    /// `started` (the generation observed before the backend call).
    async fn adopt(&self, started: u64, session: Session) -> Result<Identity> {
        let generation = started + 1;
        if self
            .generation
            .compare_exchange(started, generation, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(self.discard_superseded().await);
        }

        let identity = session.identity;
        let resolution = self.resolver.resolve(&identity.id).await;
        if !self.publish(generation, AuthState::signed_in(identity.clone(), resolution)) {
            return Err(self.discard_superseded().await);
        }
        Ok(identity)
    }

    /// Undo the backend session of a sign-in overtaken by a sign-out. When a
    /// newer sign-in or restore won instead, the persisted session is theirs.
    async fn discard_superseded(&self) -> Error {
        warn!(backend = self.backend.name(), "sign-in superseded before it completed");
        let latest = self.generation.load(Ordering::SeqCst);
        if self.signed_out_at.load(Ordering::SeqCst) == latest {
            if let Err(e) = self.backend.sign_out().await {
                warn!(backend = self.backend.name(), error = %e, "could not discard superseded session");
            }
        }
        Error::authentication("Sign-in was cancelled")
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish `next` unless a newer operation has started since `generation`.
    /// Returns whether it was published.
    fn publish(&self, generation: u64, next: AuthState) -> bool {
        let mut published = false;
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = next;
            published = true;
            true
        });
        published
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::adapters::duckdb::DuckDbStore;
    use crate::adapters::local_auth::{
        LocalSessionBackend, INVALID_TEST_CREDENTIALS, LOCAL_SESSION_KEY, MOCK_USER_ID,
        TEST_EMAIL, TEST_PASSWORD,
    };
    use crate::adapters::local_storage::MemoryKeyValueStore;
    use crate::adapters::supabase::{RemoteSessionBackend, SupabaseClient, REMOTE_SESSION_KEY};
    use crate::adapters::supabase_mock::{self, MockConfig, MockSupabaseServer};
    use crate::domain::{PrivilegeKey, PrivilegePolicy};
    use crate::ports::{DataStore, KeyValueStore};
    use crate::services::testing::{memory_store, RecordingStore};

    fn store() -> Arc<DuckDbStore> {
        memory_store()
    }

    fn local_service(
        kv: Arc<MemoryKeyValueStore>,
        data: Arc<dyn DataStore>,
        policy: PrivilegePolicy,
    ) -> AuthService {
        AuthService::new(
            Arc::new(LocalSessionBackend::new(kv)),
            PrivilegeResolver::new(data, policy),
        )
    }

    #[tokio::test]
    async fn test_starts_uninitialized_and_loading() {
        let service = local_service(
            Arc::new(MemoryKeyValueStore::new()),
            store(),
            PrivilegePolicy::FailOpen,
        );
        let state = service.state();
        assert_eq!(state.phase, AuthPhase::Uninitialized);
        assert!(state.loading);
        assert!(state.identity.is_none());
    }

    #[tokio::test]
    async fn test_initialize_without_session_is_ready_and_anonymous() {
        let service = local_service(
            Arc::new(MemoryKeyValueStore::new()),
            store(),
            PrivilegePolicy::FailOpen,
        );

        let restored = service.initialize().await.unwrap();

        assert!(restored.is_none());
        assert_eq!(service.state(), AuthState::anonymous());
    }

    #[tokio::test]
    async fn test_local_sign_in_persists_and_grants_defaults() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let service = local_service(kv.clone(), store(), PrivilegePolicy::FailOpen);
        service.initialize().await.unwrap();

        let identity = service.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();

        assert_eq!(identity.id, MOCK_USER_ID);
        assert_eq!(identity.email, TEST_EMAIL);
        let state = service.state();
        assert!(!state.loading);
        assert_eq!(state.privileges, Some(PrivilegeSet::all_granted()));
        assert_eq!(state.privilege_source, Some(PrivilegeSource::PolicyDefault));
        assert!(kv.get(LOCAL_SESSION_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_local_wrong_password_leaves_state_untouched() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let service = local_service(kv.clone(), store(), PrivilegePolicy::FailOpen);
        service.initialize().await.unwrap();
        let before = service.state();

        let err = service.sign_in(TEST_EMAIL, "wrong").await.unwrap_err();

        assert!(matches!(err, Error::Authentication(_)));
        assert_eq!(err.page_message(), INVALID_TEST_CREDENTIALS);
        assert_eq!(service.state(), before);
        assert!(kv.get(LOCAL_SESSION_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_after_restart() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let data = store();
        let first = local_service(kv.clone(), data.clone(), PrivilegePolicy::FailOpen);
        first.initialize().await.unwrap();
        first.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();

        let second = local_service(kv, data, PrivilegePolicy::FailOpen);
        let restored = second.initialize().await.unwrap();

        assert_eq!(restored.map(|i| i.id), Some(MOCK_USER_ID.to_string()));
        let state = second.state();
        assert_eq!(state.phase, AuthPhase::Ready);
        assert!(state.privileges.is_some());
    }

    #[tokio::test]
    async fn test_corrupt_persisted_record_restores_nothing() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.set(LOCAL_SESSION_KEY, "{not json").unwrap();
        let service = local_service(kv.clone(), store(), PrivilegePolicy::FailOpen);

        assert!(service.initialize().await.unwrap().is_none());
        assert!(!service.state().is_authenticated());
        assert!(kv.get(LOCAL_SESSION_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_is_idempotent() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let service = local_service(kv.clone(), store(), PrivilegePolicy::FailOpen);
        service.initialize().await.unwrap();
        service.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();

        service.sign_out().await;
        service.sign_out().await;

        let state = service.state();
        assert!(state.identity.is_none());
        assert!(state.privileges.is_none());
        assert!(!state.loading);
        assert!(kv.get(LOCAL_SESSION_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_sign_up_always_signs_in() {
        let service = local_service(
            Arc::new(MemoryKeyValueStore::new()),
            store(),
            PrivilegePolicy::FailOpen,
        );

        let outcome = service.sign_up("new@example.com", "x").await.unwrap();

        match outcome {
            SignUpOutcome::SignedIn(identity) => assert_eq!(identity.email, "new@example.com"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(service.state().is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_privileges_picks_up_new_record() {
        let data = store();
        let service = local_service(
            Arc::new(MemoryKeyValueStore::new()),
            data.clone(),
            PrivilegePolicy::FailOpen,
        );
        service.initialize().await.unwrap();
        service.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();

        let mut restricted = PrivilegeSet::all_granted();
        restricted.set(PrivilegeKey::UploadBills, false);
        data.set_privileges(MOCK_USER_ID, &restricted).unwrap();

        let resolution = service.refresh_privileges().await.unwrap();

        assert_eq!(resolution.source, PrivilegeSource::Stored);
        assert_eq!(service.state().privileges, Some(restricted));
    }

    #[tokio::test]
    async fn test_refresh_privileges_signed_out_is_noop() {
        let service = local_service(
            Arc::new(MemoryKeyValueStore::new()),
            store(),
            PrivilegePolicy::FailOpen,
        );
        service.initialize().await.unwrap();

        assert!(service.refresh_privileges().await.is_none());
        assert_eq!(service.state(), AuthState::anonymous());
    }

    #[tokio::test]
    async fn test_identity_never_published_without_privileges() {
        let data: Arc<dyn DataStore> = Arc::new(
            RecordingStore::new(store()).with_privilege_delay(Duration::from_millis(100)),
        );
        let service = Arc::new(local_service(
            Arc::new(MemoryKeyValueStore::new()),
            data,
            PrivilegePolicy::FailOpen,
        ));
        service.initialize().await.unwrap();

        let mut rx = service.subscribe();
        let watcher = tokio::spawn(async move {
            let mut seen = Vec::new();
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                let done = state.identity.is_some();
                seen.push(state);
                if done {
                    break;
                }
            }
            seen
        });

        let signer = service.clone();
        let sign_in = tokio::spawn(async move { signer.sign_in(TEST_EMAIL, TEST_PASSWORD).await });

        // Mid-flight: the backend has answered but privileges are still pending
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(service.state().identity.is_none());

        sign_in.await.unwrap().unwrap();
        let seen = watcher.await.unwrap();
        for state in &seen {
            if state.identity.is_some() && !state.loading {
                assert!(state.privileges.is_some());
            }
        }
        assert!(seen.last().unwrap().privileges.is_some());
    }

    #[tokio::test]
    async fn test_sign_out_wins_over_pending_sign_in() {
        let data: Arc<dyn DataStore> = Arc::new(
            RecordingStore::new(store()).with_privilege_delay(Duration::from_millis(100)),
        );
        let kv = Arc::new(MemoryKeyValueStore::new());
        let service = Arc::new(local_service(kv.clone(), data, PrivilegePolicy::FailOpen));
        service.initialize().await.unwrap();

        let signer = service.clone();
        let sign_in = tokio::spawn(async move { signer.sign_in(TEST_EMAIL, TEST_PASSWORD).await });
        tokio::time::sleep(Duration::from_millis(30)).await;
        service.sign_out().await;

        let err = sign_in.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert!(!service.state().is_authenticated());
        assert!(kv.get(LOCAL_SESSION_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_during_remote_password_grant() {
        let config = MockConfig {
            token_delay: Some(Duration::from_millis(200)),
            ..MockConfig::default()
        };
        let server = MockSupabaseServer::start(config).unwrap();
        let kv = Arc::new(MemoryKeyValueStore::new());
        let client = Arc::new(SupabaseClient::new(&server.base_url(), "anon").unwrap());
        let service = Arc::new(AuthService::new(
            Arc::new(RemoteSessionBackend::new(client.clone(), kv.clone())),
            PrivilegeResolver::new(client.clone(), PrivilegePolicy::FailOpen),
        ));
        service.initialize().await.unwrap();

        let signer = service.clone();
        let sign_in = tokio::spawn(async move {
            signer.sign_in("someone@example.com", "correct-horse").await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        service.sign_out().await;

        let err = sign_in.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert!(!service.state().is_authenticated());
        assert!(kv.get(REMOTE_SESSION_KEY).unwrap().is_none());
        assert!(client.access_token().is_none());
        // The late token was revoked on the server
        assert_eq!(server.with_state(|s| s.logout_calls), 1);
    }

    #[tokio::test]
    async fn test_later_sign_in_keeps_its_session() {
        let data: Arc<dyn DataStore> = Arc::new(
            RecordingStore::new(store()).with_privilege_delay(Duration::from_millis(100)),
        );
        let kv = Arc::new(MemoryKeyValueStore::new());
        let service = Arc::new(local_service(kv.clone(), data, PrivilegePolicy::FailOpen));
        service.initialize().await.unwrap();

        let first = service.clone();
        let first = tokio::spawn(async move { first.sign_in(TEST_EMAIL, TEST_PASSWORD).await });
        tokio::time::sleep(Duration::from_millis(30)).await;
        let second = service.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();

        assert!(first.await.unwrap().is_err());
        assert_eq!(service.state().identity, Some(second));
        assert!(kv.get(LOCAL_SESSION_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_sign_in_does_not_disturb_initialize() {
        let data: Arc<dyn DataStore> = Arc::new(
            RecordingStore::new(store()).with_privilege_delay(Duration::from_millis(50)),
        );
        let kv = Arc::new(MemoryKeyValueStore::new());
        let seed = local_service(kv.clone(), store(), PrivilegePolicy::FailOpen);
        seed.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();

        let service = Arc::new(local_service(kv, data, PrivilegePolicy::FailOpen));
        let init = service.clone();
        let init = tokio::spawn(async move { init.initialize().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(service.sign_in(TEST_EMAIL, "wrong").await.is_err());

        assert!(init.await.unwrap().unwrap().is_some());
        let state = service.state();
        assert_eq!(state.phase, AuthPhase::Ready);
        assert!(state.is_authenticated());
    }

    #[tokio::test]
    async fn test_remote_sign_in_uses_stored_privileges() {
        let mut restricted = PrivilegeSet::all_granted();
        restricted.set(PrivilegeKey::DownloadReports, false);
        let mut config = MockConfig::default();
        config
            .privileges
            .insert(
                supabase_mock::MOCK_USER_ID.to_string(),
                serde_json::to_value(restricted).unwrap(),
            );
        let server = MockSupabaseServer::start(config).unwrap();

        let client = Arc::new(SupabaseClient::new(&server.base_url(), "anon").unwrap());
        let kv = Arc::new(MemoryKeyValueStore::new());
        let service = AuthService::new(
            Arc::new(RemoteSessionBackend::new(client.clone(), kv)),
            PrivilegeResolver::new(client, PrivilegePolicy::FailOpen),
        );
        service.initialize().await.unwrap();

        service
            .sign_in("someone@example.com", "correct-horse")
            .await
            .unwrap();

        let state = service.state();
        assert_eq!(state.privileges, Some(restricted));
        assert_eq!(state.privilege_source, Some(PrivilegeSource::Stored));
        assert_eq!(service.backend_name(), "remote");
    }

    #[tokio::test]
    async fn test_remote_partial_privilege_row_keeps_stored_denials() {
        let mut config = MockConfig::default();
        config.privileges.insert(
            supabase_mock::MOCK_USER_ID.to_string(),
            serde_json::json!({
                "add_expense": false,
                "add_income": null,
                "view_reports": true,
                "upload_bills": null
            }),
        );
        let server = MockSupabaseServer::start(config).unwrap();

        let client = Arc::new(SupabaseClient::new(&server.base_url(), "anon").unwrap());
        let service = AuthService::new(
            Arc::new(RemoteSessionBackend::new(
                client.clone(),
                Arc::new(MemoryKeyValueStore::new()),
            )),
            PrivilegeResolver::new(client, PrivilegePolicy::FailOpen),
        );
        service.initialize().await.unwrap();
        service
            .sign_in("someone@example.com", "correct-horse")
            .await
            .unwrap();

        let state = service.state();
        let privileges = state.privileges.unwrap();
        assert!(!privileges.add_expense);
        assert!(privileges.add_income);
        assert!(privileges.view_reports);
        assert!(privileges.upload_bills);
        assert!(privileges.download_reports);
        assert_eq!(state.privilege_source, Some(PrivilegeSource::Stored));

        let menu = crate::services::visible_entries("/", state.privileges.as_ref());
        assert!(menu.iter().all(|item| item.route != crate::services::Route::AddExpense));
        assert_eq!(menu.len(), 5);
    }

    #[tokio::test]
    async fn test_remote_privilege_failure_falls_back() {
        let server = MockSupabaseServer::start(MockConfig {
            fail_privileges: true,
            ..MockConfig::default()
        })
        .unwrap();

        let client = Arc::new(SupabaseClient::new(&server.base_url(), "anon").unwrap());
        let service = AuthService::new(
            Arc::new(RemoteSessionBackend::new(
                client.clone(),
                Arc::new(MemoryKeyValueStore::new()),
            )),
            PrivilegeResolver::new(client, PrivilegePolicy::FailOpen),
        );
        service.initialize().await.unwrap();
        service
            .sign_in("someone@example.com", "correct-horse")
            .await
            .unwrap();

        let state = service.state();
        assert_eq!(state.privileges, Some(PrivilegeSet::all_granted()));
        assert_eq!(state.privilege_source, Some(PrivilegeSource::PolicyDefault));
    }

    #[tokio::test]
    async fn test_remote_rejected_password() {
        let server = MockSupabaseServer::start(MockConfig::default()).unwrap();
        let client = Arc::new(SupabaseClient::new(&server.base_url(), "anon").unwrap());
        let service = AuthService::new(
            Arc::new(RemoteSessionBackend::new(
                client.clone(),
                Arc::new(MemoryKeyValueStore::new()),
            )),
            PrivilegeResolver::new(client, PrivilegePolicy::FailOpen),
        );
        service.initialize().await.unwrap();

        let err = service
            .sign_in("someone@example.com", "nope")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Authentication(_)));
        assert!(!service.state().is_authenticated());
    }
}
