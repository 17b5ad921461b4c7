//! Transaction domain model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Direction;

/// A single income or expense entry belonging to a person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub person_id: Uuid,
    pub type_id: i64,
    /// Always positive; the sign comes from the type's category direction
    pub amount: Decimal,
    pub transaction_date: NaiveDate,
    pub description: Option<String>,
    /// Receipt slot. Nothing links bills to transactions yet.
    pub bill_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(person_id: Uuid, type_id: i64, amount: Decimal, transaction_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            person_id,
            type_id,
            amount,
            transaction_date,
            description: None,
            bill_id: None,
            created_at: Utc::now(),
        }
    }

    /// Attach a description, dropping it when blank
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        let trimmed = description.trim();
        self.description = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }
}

/// Transaction joined with its type and category, as pages read it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub id: Uuid,
    pub person_id: Uuid,
    pub type_id: i64,
    pub type_name: String,
    pub category_name: String,
    pub direction: Direction,
    pub amount: Decimal,
    pub transaction_date: NaiveDate,
    pub description: Option<String>,
    pub bill_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TransactionDetail {
    /// Amount with the direction applied: positive for income, negative for expenses
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            Direction::Income => self.amount,
            Direction::Expense => -self.amount,
        }
    }
}
