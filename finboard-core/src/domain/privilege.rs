//! Per-identity privilege flags and the policy applied when none are stored

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One named capability gating a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegeKey {
    AddExpense,
    AddIncome,
    ViewReports,
    UploadBills,
    DownloadReports,
}

impl PrivilegeKey {
    pub const ALL: [PrivilegeKey; 5] = [
        PrivilegeKey::AddExpense,
        PrivilegeKey::AddIncome,
        PrivilegeKey::ViewReports,
        PrivilegeKey::UploadBills,
        PrivilegeKey::DownloadReports,
    ];

    /// Column name in the privilege table
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivilegeKey::AddExpense => "add_expense",
            PrivilegeKey::AddIncome => "add_income",
            PrivilegeKey::ViewReports => "view_reports",
            PrivilegeKey::UploadBills => "upload_bills",
            PrivilegeKey::DownloadReports => "download_reports",
        }
    }
}

impl fmt::Display for PrivilegeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivilegeKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        PrivilegeKey::ALL
            .into_iter()
            .find(|key| key.as_str() == wanted)
            .ok_or_else(|| format!("Unknown privilege: {}", s.trim()))
    }
}

/// The five capability flags of one identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeSet {
    pub add_expense: bool,
    pub add_income: bool,
    pub view_reports: bool,
    pub upload_bills: bool,
    pub download_reports: bool,
}

impl PrivilegeSet {
    pub const fn all_granted() -> Self {
        Self {
            add_expense: true,
            add_income: true,
            view_reports: true,
            upload_bills: true,
            download_reports: true,
        }
    }

    pub const fn all_denied() -> Self {
        Self {
            add_expense: false,
            add_income: false,
            view_reports: false,
            upload_bills: false,
            download_reports: false,
        }
    }

    pub fn allows(&self, key: PrivilegeKey) -> bool {
        match key {
            PrivilegeKey::AddExpense => self.add_expense,
            PrivilegeKey::AddIncome => self.add_income,
            PrivilegeKey::ViewReports => self.view_reports,
            PrivilegeKey::UploadBills => self.upload_bills,
            PrivilegeKey::DownloadReports => self.download_reports,
        }
    }

    pub fn set(&mut self, key: PrivilegeKey, granted: bool) {
        let flag = match key {
            PrivilegeKey::AddExpense => &mut self.add_expense,
            PrivilegeKey::AddIncome => &mut self.add_income,
            PrivilegeKey::ViewReports => &mut self.view_reports,
            PrivilegeKey::UploadBills => &mut self.upload_bills,
            PrivilegeKey::DownloadReports => &mut self.download_reports,
        };
        *flag = granted;
    }

    /// Keys that are currently granted, in declaration order
    pub fn granted(&self) -> Vec<PrivilegeKey> {
        PrivilegeKey::ALL
            .into_iter()
            .filter(|key| self.allows(*key))
            .collect()
    }
}

/// A privilege row as stored. Any column may be null or missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredPrivileges {
    pub add_expense: Option<bool>,
    pub add_income: Option<bool>,
    pub view_reports: Option<bool>,
    pub upload_bills: Option<bool>,
    pub download_reports: Option<bool>,
}

impl StoredPrivileges {
    pub fn get(&self, key: PrivilegeKey) -> Option<bool> {
        match key {
            PrivilegeKey::AddExpense => self.add_expense,
            PrivilegeKey::AddIncome => self.add_income,
            PrivilegeKey::ViewReports => self.view_reports,
            PrivilegeKey::UploadBills => self.upload_bills,
            PrivilegeKey::DownloadReports => self.download_reports,
        }
    }

    /// Stored values win key by key; absent keys take `defaults`
    pub fn merge(&self, defaults: PrivilegeSet) -> PrivilegeSet {
        let mut merged = defaults;
        for key in PrivilegeKey::ALL {
            if let Some(granted) = self.get(key) {
                merged.set(key, granted);
            }
        }
        merged
    }
}

impl From<PrivilegeSet> for StoredPrivileges {
    fn from(set: PrivilegeSet) -> Self {
        Self {
            add_expense: Some(set.add_expense),
            add_income: Some(set.add_income),
            view_reports: Some(set.view_reports),
            upload_bills: Some(set.upload_bills),
            download_reports: Some(set.download_reports),
        }
    }
}

/// What an identity without a stored privilege record may do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrivilegePolicy {
    /// Everything is granted
    FailOpen,
    /// Nothing is granted
    FailClosed,
}

/// Policy used when configuration does not name one.
pub const DEFAULT_PRIVILEGE_POLICY: PrivilegePolicy = PrivilegePolicy::FailOpen;

impl PrivilegePolicy {
    pub fn default_set(&self) -> PrivilegeSet {
        match self {
            PrivilegePolicy::FailOpen => PrivilegeSet::all_granted(),
            PrivilegePolicy::FailClosed => PrivilegeSet::all_denied(),
        }
    }
}

impl Default for PrivilegePolicy {
    fn default() -> Self {
        DEFAULT_PRIVILEGE_POLICY
    }
}

impl FromStr for PrivilegePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "failopen" | "open" => Ok(PrivilegePolicy::FailOpen),
            "failclosed" | "closed" => Ok(PrivilegePolicy::FailClosed),
            other => Err(format!("Unknown privilege policy: {}", other)),
        }
    }
}
