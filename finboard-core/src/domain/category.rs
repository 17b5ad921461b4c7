//! Category and transaction type models
//!
//! A transaction's direction is never stored on the transaction itself; it
//! comes from the category its type belongs to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether money flows in or out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Income => "income",
            Direction::Expense => "expense",
        }
    }

    /// Capitalized form for page messages
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Income => "Income",
            Direction::Expense => "Expense",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Direction::Income),
            "expense" => Ok(Direction::Expense),
            other => Err(format!("Unknown direction: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub direction: Direction,
}

/// A selectable transaction type, e.g. "Salary" under an income category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionType {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
}
