//! `fb logs` - inspect and prune the event log

use anyhow::{anyhow, Result};
use chrono::{Duration, Local, Utc};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use finboard_core::{EventKind, LogFilter, LoggingService};

use super::get_finboard_dir;
use crate::output;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent events
    List {
        /// Number of events to show
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
        /// Only failed sign-ins, entries, uploads and refused pages
        #[arg(long)]
        failures: bool,
        /// Only this event (e.g. page_forbidden)
        #[arg(long)]
        event: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete old events
    Clear {
        /// Keep the last N days
        #[arg(long, default_value_t = 30)]
        older_than_days: u32,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Event counts and where the log lives
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn open() -> Result<LoggingService> {
    LoggingService::new(&get_finboard_dir()?, env!("CARGO_PKG_VERSION"))
}

pub fn run(command: LogsCommands) -> Result<()> {
    match command {
        LogsCommands::List {
            limit,
            failures,
            event,
            json,
        } => list(limit, failures, event, json),
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => clear(older_than_days, force, json),
        LogsCommands::Stats { json } => stats(json),
    }
}

fn list(limit: usize, failures_only: bool, event: Option<String>, json: bool) -> Result<()> {
    let event = event
        .map(|name| name.parse::<EventKind>())
        .transpose()
        .map_err(|e| anyhow!(e))?;
    let entries = open()?.list(&LogFilter {
        limit,
        failures_only,
        event,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No events recorded.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Event", "Backend", "Page", "Detail"]);
    for entry in entries {
        let event = if entry.failed {
            entry.event.red().to_string()
        } else {
            entry.event
        };
        // Refused pages name the missing privilege, failures their error class
        let detail = entry.privilege.or(entry.error_kind).unwrap_or_default();
        table.add_row(vec![
            entry
                .logged_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            event,
            entry.backend.unwrap_or_default(),
            entry.page.unwrap_or_default(),
            detail,
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn clear(older_than_days: u32, force: bool, json: bool) -> Result<()> {
    let service = open()?;
    let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete events older than {} days?", older_than_days))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let deleted = service.delete_before(cutoff)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": deleted }));
    } else {
        output::success(&format!("Deleted {} events", deleted));
    }
    Ok(())
}

fn stats(json: bool) -> Result<()> {
    let service = open()?;
    let total = service.count()?;
    let counts = service.counts_by_event()?;
    let size = std::fs::metadata(service.db_path()).map(|m| m.len()).unwrap_or(0);

    if json {
        let events: serde_json::Map<String, serde_json::Value> = counts
            .into_iter()
            .map(|(event, count)| (event, count.into()))
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "total": total,
                "events": events,
                "path": service.db_path().to_string_lossy(),
                "sizeBytes": size,
            }))?
        );
        return Ok(());
    }

    println!("{}", "Event log".bold());
    println!("  {} events, {}", total, output::format_size(size));
    println!("  {}", service.db_path().display().to_string().dimmed());
    if counts.is_empty() {
        return Ok(());
    }

    println!();
    let mut table = output::create_table();
    table.set_header(vec!["Event", "Count"]);
    for (event, count) in counts {
        let failed = event
            .parse::<EventKind>()
            .map(|kind| kind.is_failure())
            .unwrap_or(false);
        let name = if failed { event.red().to_string() } else { event };
        table.add_row(vec![name, count.to_string()]);
    }
    println!("{}", table);
    Ok(())
}
