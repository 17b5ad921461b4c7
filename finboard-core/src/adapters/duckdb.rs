//! DuckDB store for offline (local) mode
//!
//! Mirrors the hosted relational schema in a single DuckDB file so every page
//! works without the remote service.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use duckdb::{params, Connection};
use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    Bill, Category, Direction, Person, PrivilegeSet, StoredPrivileges, Transaction,
    TransactionDetail, TransactionType,
};
use crate::migrations::MIGRATIONS;
use crate::ports::DataStore;
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

fn db_err(e: duckdb::Error) -> Error {
    Error::database(e.to_string())
}

const TRANSACTION_DETAIL_SELECT: &str = "
    SELECT tr.id, tr.person_id, tr.type_id, CAST(tr.amount AS VARCHAR),
           tr.transaction_date::VARCHAR, tr.description, tr.bill_id, tr.created_at::VARCHAR,
           t.name, c.name, c.direction
    FROM transactions tr
    JOIN types t ON t.id = tr.type_id
    JOIN categories c ON c.id = t.category_id";

/// DuckDB-backed [`DataStore`]
pub struct DuckDbStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl DuckDbStore {
    /// Open (or create) the store at `db_path`
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which happen when two CLI invocations touch the file at once.
    pub fn open(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: Some(db_path.to_path_buf()),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        warn!(
                            delay_ms = delay.as_millis() as u64,
                            attempt = attempt + 1,
                            "offline database busy, retrying: {}",
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::database(format!(
                "Failed to open database after {} retries",
                MAX_RETRIES
            ))
        }))
    }

    /// Store that lives only as long as this value
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Extensions are statically linked; never autoload cached ones
        let config = duckdb::Config::default()
            .enable_autoload_extension(false)
            .map_err(db_err)?;
        Connection::open_with_flags(db_path, config).map_err(db_err)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Run pending migrations
    pub fn ensure_schema(&self) -> Result<MigrationResult> {
        let conn = self.conn()?;
        MigrationService::new(&conn, MIGRATIONS)
            .run_pending()
            .map_err(|e| Error::database(format!("Migration failed: {}", e)))
    }

    /// Store (or replace) the privilege record of an identity
    pub fn set_privileges(&self, identity_id: &str, privileges: &PrivilegeSet) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO user_privileges
                (user_id, add_expense, add_income, view_reports, upload_bills, download_reports)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (user_id) DO UPDATE SET
                add_expense = excluded.add_expense,
                add_income = excluded.add_income,
                view_reports = excluded.view_reports,
                upload_bills = excluded.upload_bills,
                download_reports = excluded.download_reports",
            params![
                identity_id,
                privileges.add_expense,
                privileges.add_income,
                privileges.view_reports,
                privileges.upload_bills,
                privileges.download_reports,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Forget the privilege record of an identity
    pub fn clear_privileges(&self, identity_id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM user_privileges WHERE user_id = ?", [identity_id])
            .map_err(db_err)?;
        Ok(())
    }

    /// Number of stored transactions across all persons
    pub fn transaction_count(&self) -> Result<i64> {
        let conn = self.conn()?;
        conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))
            .map_err(db_err)
    }

    fn select_person(conn: &Connection, email: &str) -> Result<Option<Person>> {
        let mut stmt = conn
            .prepare("SELECT id, email, created_at::VARCHAR FROM persons WHERE email = ?")
            .map_err(db_err)?;
        let mut rows = stmt
            .query_map([email], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(db_err)?;

        let Some(row) = rows.next() else {
            return Ok(None);
        };
        let (id, email, created_at) = row.map_err(db_err)?;
        Ok(Some(Person {
            id: parse_uuid(&id)?,
            email,
            created_at: parse_timestamp(&created_at),
        }))
    }
}

#[async_trait]
impl DataStore for DuckDbStore {
    async fn get_privileges(&self, identity_id: &str) -> Result<Option<StoredPrivileges>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT add_expense, add_income, view_reports, upload_bills, download_reports
                 FROM user_privileges WHERE user_id = ?",
            )
            .map_err(db_err)?;
        let mut rows = stmt
            .query_map([identity_id], |row| {
                Ok(StoredPrivileges {
                    add_expense: row.get(0)?,
                    add_income: row.get(1)?,
                    view_reports: row.get(2)?,
                    upload_bills: row.get(3)?,
                    download_reports: row.get(4)?,
                })
            })
            .map_err(db_err)?;

        rows.next().transpose().map_err(db_err)
    }

    async fn find_person_by_email(&self, email: &str) -> Result<Option<Person>> {
        let conn = self.conn()?;
        Self::select_person(&conn, email)
    }

    async fn upsert_person(&self, email: &str) -> Result<Person> {
        let conn = self.conn()?;
        let candidate = Person::new(email);

        conn.execute(
            "INSERT INTO persons (id, email, created_at)
             VALUES (?, ?, CAST(? AS TIMESTAMP))
             ON CONFLICT (email) DO NOTHING",
            params![
                candidate.id.to_string(),
                candidate.email,
                format_timestamp(&candidate.created_at),
            ],
        )
        .map_err(db_err)?;

        Self::select_person(&conn, email)?
            .ok_or_else(|| Error::database(format!("Person upsert lost row for {}", email)))
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, name, direction FROM categories ORDER BY id")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(db_err)?;

        let mut categories = Vec::new();
        for row in rows {
            let (id, name, direction) = row.map_err(db_err)?;
            categories.push(Category {
                id,
                name,
                direction: parse_direction(&direction)?,
            });
        }
        Ok(categories)
    }

    async fn list_types(&self, direction: Direction) -> Result<Vec<TransactionType>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT t.id, t.name, t.category_id
                 FROM types t
                 JOIN categories c ON c.id = t.category_id
                 WHERE c.direction = ?
                 ORDER BY t.name",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([direction.as_str()], |row| {
                Ok(TransactionType {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    category_id: row.get(2)?,
                })
            })
            .map_err(db_err)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err)
    }

    async fn insert_transaction(&self, transaction: &Transaction) -> Result<Transaction> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO transactions
                (id, person_id, type_id, amount, transaction_date, description, bill_id, created_at)
             VALUES (?, ?, ?, CAST(? AS DECIMAL(15, 2)), CAST(? AS DATE), ?, ?, CAST(? AS TIMESTAMP))",
            params![
                transaction.id.to_string(),
                transaction.person_id.to_string(),
                transaction.type_id,
                transaction.amount.to_string(),
                transaction.transaction_date.format("%Y-%m-%d").to_string(),
                transaction.description,
                transaction.bill_id.map(|id| id.to_string()),
                format_timestamp(&transaction.created_at),
            ],
        )
        .map_err(db_err)?;

        // Hand back the amount as the column stored it
        let stored: String = conn
            .query_row(
                "SELECT CAST(amount AS VARCHAR) FROM transactions WHERE id = ?",
                [transaction.id.to_string()],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        let amount = Decimal::from_str(&stored)
            .map_err(|e| Error::database(format!("Bad amount '{}': {}", stored, e)))?;

        Ok(Transaction {
            amount,
            ..transaction.clone()
        })
    }

    async fn list_transactions(&self, person_id: Uuid) -> Result<Vec<TransactionDetail>> {
        let conn = self.conn()?;
        let sql = format!(
            "{} WHERE tr.person_id = ? ORDER BY tr.transaction_date DESC, tr.created_at DESC",
            TRANSACTION_DETAIL_SELECT
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map([person_id.to_string()], |row| {
                Ok(DetailRow {
                    id: row.get(0)?,
                    person_id: row.get(1)?,
                    type_id: row.get(2)?,
                    amount: row.get(3)?,
                    transaction_date: row.get(4)?,
                    description: row.get(5)?,
                    bill_id: row.get(6)?,
                    created_at: row.get(7)?,
                    type_name: row.get(8)?,
                    category_name: row.get(9)?,
                    direction: row.get(10)?,
                })
            })
            .map_err(db_err)?;

        let mut details = Vec::new();
        for row in rows {
            details.push(row.map_err(db_err)?.into_detail()?);
        }
        Ok(details)
    }

    async fn insert_bill(&self, bill: &Bill) -> Result<Bill> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO bills (id, person_id, name, path, mime, extension, created_at)
             VALUES (?, ?, ?, ?, ?, ?, CAST(? AS TIMESTAMP))",
            params![
                bill.id.to_string(),
                bill.person_id.to_string(),
                bill.name,
                bill.path,
                bill.mime,
                bill.extension,
                format_timestamp(&bill.created_at),
            ],
        )
        .map_err(db_err)?;

        Ok(bill.clone())
    }

    async fn list_bills(&self, person_id: Uuid) -> Result<Vec<Bill>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, person_id, name, path, mime, extension, created_at::VARCHAR
                 FROM bills WHERE person_id = ? ORDER BY created_at DESC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([person_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })
            .map_err(db_err)?;

        let mut bills = Vec::new();
        for row in rows {
            let (id, person_id, name, path, mime, extension, created_at) = row.map_err(db_err)?;
            bills.push(Bill {
                id: parse_uuid(&id)?,
                person_id: parse_uuid(&person_id)?,
                name,
                path,
                mime,
                extension,
                created_at: parse_timestamp(&created_at),
            });
        }
        Ok(bills)
    }
}

/// Raw columns of [`TRANSACTION_DETAIL_SELECT`]
struct DetailRow {
    id: String,
    person_id: String,
    type_id: i64,
    amount: String,
    transaction_date: String,
    description: Option<String>,
    bill_id: Option<String>,
    created_at: String,
    type_name: String,
    category_name: String,
    direction: String,
}

impl DetailRow {
    fn into_detail(self) -> Result<TransactionDetail> {
        Ok(TransactionDetail {
            id: parse_uuid(&self.id)?,
            person_id: parse_uuid(&self.person_id)?,
            type_id: self.type_id,
            type_name: self.type_name,
            category_name: self.category_name,
            direction: parse_direction(&self.direction)?,
            amount: Decimal::from_str(&self.amount)
                .map_err(|e| Error::database(format!("Bad amount '{}': {}", self.amount, e)))?,
            transaction_date: parse_date(&self.transaction_date)?,
            description: self.description,
            bill_id: self.bill_id.as_deref().map(parse_uuid).transpose()?,
            created_at: parse_timestamp(&self.created_at),
        })
    }
}

// Helper functions

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::database(format!("Bad id '{}': {}", s, e)))
}

fn parse_direction(s: &str) -> Result<Direction> {
    Direction::from_str(s).map_err(Error::database)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::database(format!("Bad date '{}': {}", s, e)))
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// DuckDB renders TIMESTAMP as `2024-01-02 03:04:05.123456` (UTC by construction)
fn parse_timestamp(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .unwrap_or_else(|_| Utc::now())
}
