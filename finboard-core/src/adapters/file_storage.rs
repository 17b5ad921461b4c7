//! Local filesystem blob storage for offline mode

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::domain::result::{Error, Result};
use crate::ports::BlobStorage;

/// Stores objects under `<root>/<bucket>/<path>`
#[derive(Debug, Clone)]
pub struct FileBlobStorage {
    root: PathBuf,
}

impl FileBlobStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of an object, rejecting paths that escape the bucket
    pub fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain || bucket.is_empty() || bucket.contains(['/', '\\']) {
            return Err(Error::storage(format!("Invalid object path: {}/{}", bucket, path)));
        }
        Ok(self.root.join(bucket).join(relative))
    }
}

#[async_trait]
impl BlobStorage for FileBlobStorage {
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String> {
        let target = self.object_path(bucket, path)?;
        if tokio::fs::try_exists(&target).await? {
            return Err(Error::storage(format!("Object already exists: {}", path)));
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        Ok(path.to_string())
    }
}
