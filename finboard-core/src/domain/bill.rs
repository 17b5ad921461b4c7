//! Bill receipt metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A receipt file stored in object storage under the owner's person id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub id: Uuid,
    pub person_id: Uuid,
    /// Original file name as supplied by the user
    pub name: String,
    /// Object path inside the bills bucket
    pub path: String,
    pub mime: String,
    pub extension: String,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    /// Lowercased extension of a file name, without the dot
    pub fn extension_of(file_name: &str) -> Option<String> {
        let (stem, ext) = file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }

    pub fn mime_for_extension(extension: &str) -> &'static str {
        match extension {
            "pdf" => "application/pdf",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            _ => "application/octet-stream",
        }
    }
}
