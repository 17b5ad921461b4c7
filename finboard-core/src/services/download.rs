//! Downloads page - export the signed-in person's transactions

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::TransactionDetail;
use crate::ports::DataStore;
use crate::services::auth::AuthService;
use crate::services::dashboard::current_person;

const CSV_HEADERS: [&str; 7] = [
    "date",
    "type",
    "category",
    "direction",
    "amount",
    "description",
    "id",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(Error::validation(format!(
                "Unsupported export format: {} (use csv or json)",
                other
            ))),
        }
    }
}

/// Inclusive date window; either end may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(Error::validation("Start date must not be after end date"));
            }
        }
        Ok(Self { from, to })
    }

    /// Everything
    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    fn file_suffix(&self) -> String {
        match (self.from, self.to) {
            (None, None) => String::new(),
            (from, to) => format!(
                "_{}_{}",
                from.map_or("start".to_string(), |d| d.to_string()),
                to.map_or("today".to_string(), |d| d.to_string())
            ),
        }
    }
}

/// A rendered export, ready to be written out
#[derive(Debug, Clone)]
pub struct Export {
    pub file_name: String,
    pub format: ExportFormat,
    pub rows: usize,
    pub bytes: Vec<u8>,
}

impl Export {
    /// Write into `dir` (created if missing), returning the file path
    pub fn save(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

pub struct DownloadService {
    store: Arc<dyn DataStore>,
    auth: Arc<AuthService>,
}

impl DownloadService {
    pub fn new(store: Arc<dyn DataStore>, auth: Arc<AuthService>) -> Self {
        Self { store, auth }
    }

    pub async fn export(&self, format: ExportFormat, range: DateRange) -> Result<Export> {
        let transactions = match current_person(self.store.as_ref(), &self.auth).await? {
            Some(person) => self.store.list_transactions(person.id).await?,
            None => Vec::new(),
        };

        let selected: Vec<TransactionDetail> = transactions
            .into_iter()
            .filter(|tx| range.contains(tx.transaction_date))
            .collect();

        let bytes = match format {
            ExportFormat::Csv => render_csv(&selected)?,
            ExportFormat::Json => serde_json::to_vec_pretty(&selected)?,
        };

        Ok(Export {
            file_name: format!("transactions{}.{}", range.file_suffix(), format.extension()),
            format,
            rows: selected.len(),
            bytes,
        })
    }
}

fn render_csv(transactions: &[TransactionDetail]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS).map_err(csv_err)?;

    for tx in transactions {
        writer
            .write_record([
                tx.transaction_date.to_string(),
                tx.type_name.clone(),
                tx.category_name.clone(),
                tx.direction.to_string(),
                tx.amount.to_string(),
                tx.description.clone().unwrap_or_default(),
                tx.id.to_string(),
            ])
            .map_err(csv_err)?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Other(format!("CSV export failed: {}", e)))
}

fn csv_err(e: csv::Error) -> Error {
    Error::Other(format!("CSV export failed: {}", e))
}
