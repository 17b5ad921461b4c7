//! Offline command - manage offline mode (fixed local credential)

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use finboard_core::adapters::duckdb::DuckDbStore;
use finboard_core::adapters::local_auth::{MOCK_USER_ID, TEST_EMAIL, TEST_PASSWORD};
use finboard_core::config::Config;
use finboard_core::services::{DemoService, OFFLINE_DB};
use finboard_core::{PrivilegeKey, PrivilegeSet};

use super::get_finboard_dir;
use crate::output;

#[derive(Subcommand)]
pub enum OfflineCommands {
    /// Enable offline mode with freshly seeded sample data
    #[command(name = "on")]
    On {
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
    /// Disable offline mode
    #[command(name = "off")]
    Off {
        /// Also delete the offline database
        #[arg(long)]
        clean: bool,
    },
    /// Show offline mode status
    Status,
    /// Set the stored privileges of the offline identity
    Privileges {
        /// Privileges to deny (add_expense, add_income, view_reports, upload_bills, download_reports)
        #[arg(long, value_delimiter = ',')]
        deny: Vec<String>,
        /// Remove the stored record so the configured policy applies
        #[arg(long, conflicts_with = "deny")]
        reset: bool,
    },
}

pub async fn run(command: Option<OfflineCommands>) -> Result<()> {
    let finboard_dir = get_finboard_dir()?;
    std::fs::create_dir_all(&finboard_dir)?;
    let demo_service = DemoService::new(&finboard_dir);

    match command {
        Some(OfflineCommands::On { force }) => {
            if !force && finboard_dir.join(OFFLINE_DB).exists() {
                let confirmed = Confirm::new()
                    .with_prompt("Replace the existing offline data with fresh sample data?")
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let seeded = demo_service.enable().await?;
            println!("{}", "Offline mode enabled".green());
            println!("Seeded {} sample transactions.", seeded);
            println!(
                "Sign in with 'fb login --email {} --password {}'.",
                TEST_EMAIL, TEST_PASSWORD
            );
            Ok(())
        }
        Some(OfflineCommands::Off { clean }) => {
            demo_service.disable(clean)?;
            println!("{}", "Offline mode disabled".yellow());
            let config = Config::load(&finboard_dir)?;
            if !config.has_remote_credentials() {
                output::warning(
                    "No remote service is configured. Set FINBOARD_SUPABASE_URL and FINBOARD_SUPABASE_ANON_KEY.",
                );
            }
            Ok(())
        }
        Some(OfflineCommands::Privileges { deny, reset }) => {
            if !demo_service.is_enabled()? {
                bail!("Offline mode is off. Stored privileges of remote users are managed by the service.");
            }
            let store = DuckDbStore::open(&finboard_dir.join(OFFLINE_DB))?;
            store.ensure_schema()?;

            if reset {
                store.clear_privileges(MOCK_USER_ID)?;
                output::success("Stored privileges removed; the configured policy applies");
                return Ok(());
            }

            let mut privileges = PrivilegeSet::all_granted();
            for name in &deny {
                let key: PrivilegeKey = name.parse().map_err(anyhow::Error::msg)?;
                privileges.set(key, false);
            }
            store.set_privileges(MOCK_USER_ID, &privileges)?;

            let granted: Vec<&str> = privileges.granted().iter().map(|k| k.as_str()).collect();
            output::success(&format!("Granted: {}", granted.join(", ")));
            Ok(())
        }
        Some(OfflineCommands::Status) | None => {
            if demo_service.is_enabled()? {
                println!("Offline mode is {}", "ON".green());
            } else {
                println!("Offline mode is {}", "OFF".yellow());
            }
            Ok(())
        }
    }
}
