//! Offline mode - local auth against a seeded DuckDB store
//!
//! Offline mode lets the dashboard run without the remote service: sign in
//! with the fixed test credential and browse sample transactions.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::adapters::demo::generate_demo_transactions;
use crate::adapters::duckdb::DuckDbStore;
use crate::adapters::local_auth::TEST_EMAIL;
use crate::config::{AuthMode, Config};
use crate::ports::DataStore;

/// Database file used in offline mode
pub const OFFLINE_DB: &str = "offline.duckdb";

pub struct DemoService {
    finboard_dir: PathBuf,
}

impl DemoService {
    pub fn new(finboard_dir: &Path) -> Self {
        Self {
            finboard_dir: finboard_dir.to_path_buf(),
        }
    }

    /// Check if offline mode is currently enabled
    pub fn is_enabled(&self) -> Result<bool> {
        let config = Config::load(&self.finboard_dir)?;
        Ok(config.auth_mode == AuthMode::Local)
    }

    /// Enable offline mode
    ///
    /// This will:
    /// 1. Delete any existing offline database (fresh start)
    /// 2. Switch the auth mode to local in config
    /// 3. Seed sample transactions for the test user
    ///
    /// Returns the number of transactions seeded.
    pub async fn enable(&self) -> Result<usize> {
        self.remove_database()?;

        let mut config = Config::load(&self.finboard_dir).unwrap_or_default();
        config.set_auth_mode(AuthMode::Local);
        config.save(&self.finboard_dir)?;

        let store = DuckDbStore::open(&self.finboard_dir.join(OFFLINE_DB))?;
        store.ensure_schema()?;

        let person = store
            .upsert_person(TEST_EMAIL)
            .await
            .context("Failed to create the offline person")?;
        let transactions = generate_demo_transactions(person.id, Utc::now().date_naive());
        for tx in &transactions {
            store.insert_transaction(tx).await?;
        }

        Ok(transactions.len())
    }

    /// Disable offline mode
    ///
    /// Switches the auth mode back to remote and, if `clean` is set,
    /// deletes the offline database.
    pub fn disable(&self, clean: bool) -> Result<()> {
        let mut config = Config::load(&self.finboard_dir).unwrap_or_default();
        config.set_auth_mode(AuthMode::Remote);
        config.save(&self.finboard_dir)?;

        if clean {
            self.remove_database()?;
        }

        Ok(())
    }

    fn remove_database(&self) -> Result<()> {
        for name in [OFFLINE_DB.to_string(), format!("{}.wal", OFFLINE_DB)] {
            let path = self.finboard_dir.join(name);
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
        }
        Ok(())
    }
}
