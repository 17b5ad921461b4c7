//! Shared fixtures for service tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::adapters::duckdb::DuckDbStore;
use crate::adapters::local_auth::{LocalSessionBackend, TEST_EMAIL, TEST_PASSWORD};
use crate::adapters::local_storage::MemoryKeyValueStore;
use crate::domain::result::Result;
use crate::domain::{
    Bill, Category, Direction, Person, PrivilegePolicy, StoredPrivileges, Transaction,
    TransactionDetail, TransactionType,
};
use crate::ports::DataStore;
use crate::services::auth::AuthService;
use crate::services::privilege::PrivilegeResolver;

/// In-memory DuckDB store with the schema applied
pub fn memory_store() -> Arc<DuckDbStore> {
    let store = DuckDbStore::open_in_memory().unwrap();
    store.ensure_schema().unwrap();
    Arc::new(store)
}

/// Local-mode auth service over `data`, not yet initialized
pub fn local_auth(data: Arc<dyn DataStore>) -> Arc<AuthService> {
    Arc::new(AuthService::new(
        Arc::new(LocalSessionBackend::new(Arc::new(MemoryKeyValueStore::new()))),
        PrivilegeResolver::new(data, PrivilegePolicy::FailOpen),
    ))
}

/// Local-mode auth service already signed in as the test user
pub async fn signed_in_auth(data: Arc<dyn DataStore>) -> Arc<AuthService> {
    let auth = local_auth(data);
    auth.initialize().await.unwrap();
    auth.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
    auth
}

/// Delegates to DuckDB, counting every call and optionally stalling
/// privilege lookups
pub struct RecordingStore {
    inner: Arc<DuckDbStore>,
    calls: AtomicUsize,
    privilege_delay: Option<Duration>,
}

impl RecordingStore {
    pub fn new(inner: Arc<DuckDbStore>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            privilege_delay: None,
        }
    }

    pub fn with_privilege_delay(mut self, delay: Duration) -> Self {
        self.privilege_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DataStore for RecordingStore {
    async fn get_privileges(&self, identity_id: &str) -> Result<Option<StoredPrivileges>> {
        self.record();
        if let Some(delay) = self.privilege_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.get_privileges(identity_id).await
    }

    async fn find_person_by_email(&self, email: &str) -> Result<Option<Person>> {
        self.record();
        self.inner.find_person_by_email(email).await
    }

    async fn upsert_person(&self, email: &str) -> Result<Person> {
        self.record();
        self.inner.upsert_person(email).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.record();
        self.inner.list_categories().await
    }

    async fn list_types(&self, direction: Direction) -> Result<Vec<TransactionType>> {
        self.record();
        self.inner.list_types(direction).await
    }

    async fn insert_transaction(&self, transaction: &Transaction) -> Result<Transaction> {
        self.record();
        self.inner.insert_transaction(transaction).await
    }

    async fn list_transactions(&self, person_id: Uuid) -> Result<Vec<TransactionDetail>> {
        self.record();
        self.inner.list_transactions(person_id).await
    }

    async fn insert_bill(&self, bill: &Bill) -> Result<Bill> {
        self.record();
        self.inner.insert_bill(bill).await
    }

    async fn list_bills(&self, person_id: Uuid) -> Result<Vec<Bill>> {
        self.record();
        self.inner.list_bills(person_id).await
    }
}
