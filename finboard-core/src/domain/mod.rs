//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod bill;
mod category;
mod identity;
mod person;
pub mod privilege;
pub mod result;
mod transaction;

pub use bill::Bill;
pub use category::{Category, Direction, TransactionType};
pub use identity::{Identity, PersistedSession, PersistedTokens, Session};
pub use person::Person;
pub use privilege::{
    PrivilegeKey, PrivilegePolicy, PrivilegeSet, StoredPrivileges, DEFAULT_PRIVILEGE_POLICY,
};
pub use transaction::{Transaction, TransactionDetail};
