//! Finboard Core - auth, privileges and page data access for the Finboard
//! personal finance dashboard
//!
//! This crate follows hexagonal architecture:
//!
//! - **domain**: Core entities (Identity, PrivilegeSet, Transaction, Bill, etc.)
//! - **ports**: Trait definitions for external dependencies (SessionBackend, DataStore, ...)
//! - **services**: Business logic orchestration (auth context, route guard, pages)
//! - **adapters**: Concrete implementations (remote REST service, DuckDB, local files)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::duckdb::DuckDbStore;
use adapters::file_storage::FileBlobStorage;
use adapters::local_auth::LocalSessionBackend;
use adapters::local_storage::FileKeyValueStore;
use adapters::supabase::{RemoteSessionBackend, SupabaseClient};
use config::{AuthMode, Config};
use ports::{BlobStorage, DataStore, KeyValueStore, SessionBackend};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{
    Bill, Category, Direction, Identity, Person, PrivilegeKey, PrivilegePolicy, PrivilegeSet,
    Transaction, TransactionDetail, TransactionType,
};
pub use services::{EventKind, LogEvent, LogFilter, LoggingService};

/// File holding persisted client state (the session record)
pub const SESSION_FILE: &str = "session.json";

/// Directory for locally stored objects in offline mode
pub const STORAGE_DIR: &str = "storage";

/// The concrete adapters a context runs on, picked once per auth mode
pub struct Backends {
    pub session: Arc<dyn SessionBackend>,
    pub data: Arc<dyn DataStore>,
    pub blobs: Arc<dyn BlobStorage>,
}

impl Backends {
    /// Fixed local credential, offline DuckDB store and local object storage
    pub fn local(finboard_dir: &Path) -> Result<Self> {
        let kv: Arc<dyn KeyValueStore> =
            Arc::new(FileKeyValueStore::new(finboard_dir.join(SESSION_FILE)));

        let store = DuckDbStore::open(&finboard_dir.join(OFFLINE_DB))
            .context("Failed to open the offline database")?;
        store.ensure_schema()?;

        Ok(Self {
            session: Arc::new(LocalSessionBackend::new(kv)),
            data: Arc::new(store),
            blobs: Arc::new(FileBlobStorage::new(finboard_dir.join(STORAGE_DIR))),
        })
    }

    /// Everything delegated to the remote service
    pub fn remote(config: &Config, finboard_dir: &Path) -> Result<Self> {
        let kv: Arc<dyn KeyValueStore> =
            Arc::new(FileKeyValueStore::new(finboard_dir.join(SESSION_FILE)));
        let client = Arc::new(
            SupabaseClient::new(&config.supabase_url, &config.supabase_anon_key)
                .context("Failed to create the remote service client")?,
        );

        Ok(Self {
            session: Arc::new(RemoteSessionBackend::new(client.clone(), kv)),
            data: client.clone(),
            blobs: client,
        })
    }
}

/// Main context for Finboard operations
///
/// Owns the auth service and hands it to every page service. Nothing is
/// restored until [`AuthService::initialize`] is called.
pub struct FinboardContext {
    pub config: Config,
    pub finboard_dir: PathBuf,
    pub auth: Arc<AuthService>,
    pub entry_service: EntryService,
    pub dashboard_service: DashboardService,
    pub report_service: ReportService,
    pub download_service: DownloadService,
    pub bill_service: BillService,
}

impl FinboardContext {
    /// Create a context for the configured auth mode
    pub fn new(finboard_dir: &Path) -> Result<Self> {
        let config = Config::load(finboard_dir)?;
        let backends = match config.auth_mode {
            AuthMode::Local => Backends::local(finboard_dir)?,
            AuthMode::Remote => Backends::remote(&config, finboard_dir)?,
        };
        Ok(Self::with_backends(config, finboard_dir, backends))
    }

    pub fn with_backends(config: Config, finboard_dir: &Path, backends: Backends) -> Self {
        let resolver = PrivilegeResolver::new(backends.data.clone(), config.privilege_policy);
        let auth = Arc::new(AuthService::new(backends.session, resolver));
        let delay = config.redirect_delay;

        Self {
            entry_service: EntryService::new(backends.data.clone(), auth.clone(), delay),
            dashboard_service: DashboardService::new(backends.data.clone(), auth.clone()),
            report_service: ReportService::new(backends.data.clone(), auth.clone()),
            download_service: DownloadService::new(backends.data.clone(), auth.clone()),
            bill_service: BillService::new(backends.data, backends.blobs, auth.clone()),
            auth,
            config,
            finboard_dir: finboard_dir.to_path_buf(),
        }
    }
}
