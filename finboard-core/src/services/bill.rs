//! Bills page - receipt upload and listing

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Bill, Person};
use crate::ports::{BlobStorage, DataStore};
use crate::services::auth::AuthService;
use crate::services::dashboard::current_person;

pub const BILLS_BUCKET: &str = "bills";

pub const MAX_BILL_BYTES: u64 = 10 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: [&str; 6] = ["pdf", "png", "jpg", "jpeg", "gif", "webp"];

pub struct BillService {
    store: Arc<dyn DataStore>,
    blobs: Arc<dyn BlobStorage>,
    auth: Arc<AuthService>,
}

impl BillService {
    pub fn new(store: Arc<dyn DataStore>, blobs: Arc<dyn BlobStorage>, auth: Arc<AuthService>) -> Self {
        Self { store, blobs, auth }
    }

    /// Store a receipt file and record it for the signed-in person.
    ///
    /// The object lands at `<person_id>/<uuid>.<ext>` in the bills bucket.
    pub async fn upload(&self, file: &Path) -> Result<Bill> {
        self.auth.require_identity()?;
        let (name, extension) = validate_file(file).await?;

        let bytes = tokio::fs::read(file).await?;
        let person = self.resolve_person().await?;

        let mime = Bill::mime_for_extension(&extension);
        let object_path = format!("{}/{}.{}", person.id, Uuid::new_v4(), extension);
        let stored_path = self
            .blobs
            .put(BILLS_BUCKET, &object_path, bytes, mime)
            .await
            .map_err(logged)?;
        debug!(bucket = BILLS_BUCKET, "bill object stored");

        let bill = Bill {
            id: Uuid::new_v4(),
            person_id: person.id,
            name,
            path: stored_path,
            mime: mime.to_string(),
            extension,
            created_at: Utc::now(),
        };
        self.store.insert_bill(&bill).await.map_err(logged)
    }

    /// Bills of the signed-in person, newest first
    pub async fn list(&self) -> Result<Vec<Bill>> {
        match current_person(self.store.as_ref(), &self.auth).await? {
            Some(person) => self.store.list_bills(person.id).await,
            None => Ok(Vec::new()),
        }
    }

    async fn resolve_person(&self) -> Result<Person> {
        let identity = self.auth.require_identity()?;
        self.store.upsert_person(&identity.email).await.map_err(logged)
    }
}

/// Check the file before anything is uploaded; returns its name and extension
async fn validate_file(file: &Path) -> Result<(String, String)> {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::validation("Please choose a file to upload"))?;

    let metadata = match tokio::fs::metadata(file).await {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => return Err(Error::validation(format!("File not found: {}", name))),
    };
    if metadata.len() == 0 {
        return Err(Error::validation("The selected file is empty"));
    }
    if metadata.len() > MAX_BILL_BYTES {
        return Err(Error::validation("File is too large (maximum 10 MB)"));
    }

    let extension = Bill::extension_of(&name)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| {
            Error::validation(format!(
                "Unsupported file type. Allowed: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })?;

    Ok((name, extension))
}

fn logged(e: Error) -> Error {
    if !matches!(e, Error::Validation(_) | Error::Authentication(_)) {
        error!(error = %e, "bills page request failed");
    }
    e
}
