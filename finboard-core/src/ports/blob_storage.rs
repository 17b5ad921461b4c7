//! Blob storage port - receipt files

use async_trait::async_trait;

use crate::domain::result::Result;

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store `bytes` at `path` inside `bucket`.
    ///
    /// Returns the stored object path. Existing objects are never overwritten.
    async fn put(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String>;
}
