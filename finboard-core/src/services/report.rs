//! Reports page - per-category totals and a monthly income/expense series

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::{Direction, TransactionDetail};
use crate::ports::DataStore;
use crate::services::auth::AuthService;
use crate::services::dashboard::current_person;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub direction: Direction,
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// `YYYY-MM`
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// Largest first
    pub income_by_category: Vec<CategoryTotal>,
    /// Largest first
    pub expense_by_category: Vec<CategoryTotal>,
    /// Oldest month first
    pub monthly: Vec<MonthlyTotal>,
}

impl Report {
    pub fn from_transactions(transactions: &[TransactionDetail]) -> Self {
        let mut by_category: BTreeMap<(Direction, String), (Decimal, usize)> = BTreeMap::new();
        let mut by_month: BTreeMap<(i32, u32), (Decimal, Decimal)> = BTreeMap::new();

        for tx in transactions {
            let entry = by_category
                .entry((tx.direction, tx.category_name.clone()))
                .or_insert((Decimal::ZERO, 0));
            entry.0 += tx.amount;
            entry.1 += 1;

            let month = by_month
                .entry((tx.transaction_date.year(), tx.transaction_date.month()))
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            match tx.direction {
                Direction::Income => month.0 += tx.amount,
                Direction::Expense => month.1 += tx.amount,
            }
        }

        let mut income_by_category = Vec::new();
        let mut expense_by_category = Vec::new();
        for ((direction, category), (total, count)) in by_category {
            let row = CategoryTotal {
                category,
                direction,
                total,
                count,
            };
            match direction {
                Direction::Income => income_by_category.push(row),
                Direction::Expense => expense_by_category.push(row),
            }
        }
        // Stable sort keeps name order among equal totals
        income_by_category.sort_by(|a, b| b.total.cmp(&a.total));
        expense_by_category.sort_by(|a, b| b.total.cmp(&a.total));

        let monthly = by_month
            .into_iter()
            .map(|((year, month), (income, expense))| MonthlyTotal {
                month: format!("{:04}-{:02}", year, month),
                income,
                expense,
                net: income - expense,
            })
            .collect();

        Self {
            income_by_category,
            expense_by_category,
            monthly,
        }
    }
}

pub struct ReportService {
    store: Arc<dyn DataStore>,
    auth: Arc<AuthService>,
}

impl ReportService {
    pub fn new(store: Arc<dyn DataStore>, auth: Arc<AuthService>) -> Self {
        Self { store, auth }
    }

    pub async fn build(&self) -> Result<Report> {
        let Some(person) = current_person(self.store.as_ref(), &self.auth).await? else {
            return Ok(Report::default());
        };
        let transactions = self.store.list_transactions(person.id).await?;
        Ok(Report::from_transactions(&transactions))
    }
}
