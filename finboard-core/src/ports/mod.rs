//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod blob_storage;
mod data_store;
mod key_value;
mod session_backend;

pub use blob_storage::BlobStorage;
pub use data_store::DataStore;
pub use key_value::KeyValueStore;
pub use session_backend::SessionBackend;
