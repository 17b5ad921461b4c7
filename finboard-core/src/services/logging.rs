//! Event log - what the app did, kept in logs.duckdb
//!
//! Every row is one [`EventKind`] plus a little context: the session backend,
//! the page route, the privilege a page was refused for, or the class of the
//! error (`Error::kind()`). Emails, amounts, descriptions and file names never
//! reach this table.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeZone, Utc};
use duckdb::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};

use crate::domain::PrivilegeKey;
use crate::log_migrations::LOG_MIGRATIONS;
use crate::services::navigation::Route;
use crate::services::MigrationService;

/// Everything the app records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SignIn,
    SignInFailed,
    SignUp,
    SignOut,
    PageOpened,
    PageForbidden,
    EntryAdded,
    EntryFailed,
    BillUploaded,
    BillUploadFailed,
    ExportWritten,
}

impl EventKind {
    pub const ALL: [EventKind; 11] = [
        EventKind::SignIn,
        EventKind::SignInFailed,
        EventKind::SignUp,
        EventKind::SignOut,
        EventKind::PageOpened,
        EventKind::PageForbidden,
        EventKind::EntryAdded,
        EventKind::EntryFailed,
        EventKind::BillUploaded,
        EventKind::BillUploadFailed,
        EventKind::ExportWritten,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SignIn => "sign_in",
            EventKind::SignInFailed => "sign_in_failed",
            EventKind::SignUp => "sign_up",
            EventKind::SignOut => "sign_out",
            EventKind::PageOpened => "page_opened",
            EventKind::PageForbidden => "page_forbidden",
            EventKind::EntryAdded => "entry_added",
            EventKind::EntryFailed => "entry_failed",
            EventKind::BillUploaded => "bill_uploaded",
            EventKind::BillUploadFailed => "bill_upload_failed",
            EventKind::ExportWritten => "export_written",
        }
    }

    /// Something the user tried did not happen
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EventKind::SignInFailed
                | EventKind::PageForbidden
                | EventKind::EntryFailed
                | EventKind::BillUploadFailed
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| format!("Unknown event: {}", s.trim()))
    }
}

/// One event about to be recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub kind: EventKind,
    pub backend: Option<String>,
    pub route: Option<Route>,
    pub privilege: Option<PrivilegeKey>,
    pub error_kind: Option<&'static str>,
}

impl LogEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            backend: None,
            route: None,
            privilege: None,
            error_kind: None,
        }
    }

    /// Session backend in use ("remote" or "local")
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route = Some(route);
        self
    }

    /// The privilege a page was refused for
    pub fn with_privilege(mut self, key: PrivilegeKey) -> Self {
        self.privilege = Some(key);
        self
    }

    /// Error class, as returned by `Error::kind()`
    pub fn with_error(mut self, kind: &'static str) -> Self {
        self.error_kind = Some(kind);
        self
    }
}

/// A recorded event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub logged_at: DateTime<Utc>,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    pub failed: bool,
    pub backend: Option<String>,
    pub page: Option<String>,
    pub privilege: Option<String>,
    pub error_kind: Option<String>,
}

/// Which entries `LoggingService::list` returns
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub limit: usize,
    pub failures_only: bool,
    pub event: Option<EventKind>,
}

impl LogFilter {
    pub fn recent(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

pub struct LoggingService {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    app_version: String,
}

impl LoggingService {
    /// Open (or create) `logs.duckdb` under `finboard_dir` and migrate it
    pub fn new(finboard_dir: &Path, app_version: impl Into<String>) -> Result<Self> {
        std::fs::create_dir_all(finboard_dir)?;
        let db_path = finboard_dir.join("logs.duckdb");
        let conn = Connection::open(&db_path)?;
        MigrationService::new(&conn, LOG_MIGRATIONS).run_pending()?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            app_version: app_version.into(),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))
    }

    pub fn log(&self, event: LogEvent) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sys_logs (
                logged_at, app_version, platform, event, failed,
                backend, page, privilege, error_kind
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            duckdb::params![
                Utc::now().timestamp_millis(),
                &self.app_version,
                std::env::consts::OS,
                event.kind.as_str(),
                event.kind.is_failure(),
                event.backend,
                event.route.map(|r| r.path()),
                event.privilege.map(|k| k.as_str()),
                event.error_kind,
            ],
        )?;
        Ok(())
    }

    /// Newest first
    pub fn list(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        let mut sql = String::from(
            "SELECT id, logged_at, app_version, platform, event, failed,
                    backend, page, privilege, error_kind
             FROM sys_logs WHERE 1 = 1",
        );
        let mut args: Vec<String> = Vec::new();
        if filter.failures_only {
            sql.push_str(" AND failed");
        }
        if let Some(kind) = filter.event {
            sql.push_str(" AND event = ?");
            args.push(kind.as_str().to_string());
        }
        sql.push_str(&format!(" ORDER BY id DESC LIMIT {}", filter.limit));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
            let millis: i64 = row.get(1)?;
            Ok(LogEntry {
                id: row.get(0)?,
                logged_at: Utc
                    .timestamp_millis_opt(millis)
                    .single()
                    .unwrap_or_default(),
                app_version: row.get(2)?,
                platform: row.get(3)?,
                event: row.get(4)?,
                failed: row.get(5)?,
                backend: row.get(6)?,
                page: row.get(7)?,
                privilege: row.get(8)?,
                error_kind: row.get(9)?,
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Number of entries per event name, most frequent first
    pub fn counts_by_event(&self) -> Result<Vec<(String, u64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT event, COUNT(*) FROM sys_logs GROUP BY event ORDER BY 2 DESC, 1",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM sys_logs", [], |row| row.get(0))?)
    }

    /// Delete entries logged before `cutoff`; returns how many went
    pub fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM sys_logs WHERE logged_at < ?",
            [cutoff.timestamp_millis()],
        )?;
        Ok(deleted as u64)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
