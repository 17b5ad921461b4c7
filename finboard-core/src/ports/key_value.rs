//! Key-value port - small persisted client state

use crate::domain::result::Result;

/// String key-value store surviving process restarts.
///
/// Holds the persisted session record. `remove` of a missing key is not an
/// error.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}
