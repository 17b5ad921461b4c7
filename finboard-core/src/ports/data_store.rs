//! Data store port - relational rows behind the dashboard pages

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{
    Bill, Category, Direction, Person, StoredPrivileges, Transaction, TransactionDetail,
    TransactionType,
};

/// Row storage for persons, catalog data, transactions, bills and privileges.
///
/// Implemented by the remote REST adapter and by the local DuckDB store.
#[async_trait]
pub trait DataStore: Send + Sync {
    // === Privileges ===

    /// Stored privilege row for an identity, `None` when there is none.
    /// Columns left null in the row come back as `None`.
    async fn get_privileges(&self, identity_id: &str) -> Result<Option<StoredPrivileges>>;

    // === Persons ===

    async fn find_person_by_email(&self, email: &str) -> Result<Option<Person>>;

    /// Return the person for `email`, creating it if needed.
    ///
    /// Relies on the unique email constraint so concurrent callers end up
    /// with the same row.
    async fn upsert_person(&self, email: &str) -> Result<Person>;

    // === Catalog ===

    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Types whose category has the given direction, ordered by name
    async fn list_types(&self, direction: Direction) -> Result<Vec<TransactionType>>;

    // === Transactions ===

    async fn insert_transaction(&self, transaction: &Transaction) -> Result<Transaction>;

    /// Transactions of a person joined with type and category, newest first
    async fn list_transactions(&self, person_id: Uuid) -> Result<Vec<TransactionDetail>>;

    // === Bills ===

    async fn insert_bill(&self, bill: &Bill) -> Result<Bill>;

    /// Bills of a person, newest first
    async fn list_bills(&self, person_id: Uuid) -> Result<Vec<Bill>>;
}
