//! Dashboard summary - totals and recent activity for the signed-in person

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::{Direction, Person, TransactionDetail};
use crate::ports::DataStore;
use crate::services::auth::AuthService;

pub const DEFAULT_RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net: Decimal,
    pub transaction_count: usize,
    /// Newest first
    pub recent: Vec<TransactionDetail>,
}

impl DashboardSummary {
    /// Aggregate `transactions` (newest first) client-side
    pub fn from_transactions(transactions: Vec<TransactionDetail>, recent_limit: usize) -> Self {
        let mut total_income = Decimal::ZERO;
        let mut total_expense = Decimal::ZERO;
        for tx in &transactions {
            match tx.direction {
                Direction::Income => total_income += tx.amount,
                Direction::Expense => total_expense += tx.amount,
            }
        }

        let transaction_count = transactions.len();
        let mut recent = transactions;
        recent.truncate(recent_limit);

        Self {
            total_income,
            total_expense,
            net: total_income - total_expense,
            transaction_count,
            recent,
        }
    }
}

pub struct DashboardService {
    store: Arc<dyn DataStore>,
    auth: Arc<AuthService>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn DataStore>, auth: Arc<AuthService>) -> Self {
        Self { store, auth }
    }

    /// Summary for the signed-in identity.
    ///
    /// Reading never creates a person: someone who has not recorded anything
    /// yet gets an empty summary.
    pub async fn summary(&self, recent_limit: usize) -> Result<DashboardSummary> {
        match current_person(self.store.as_ref(), &self.auth).await? {
            Some(person) => {
                let transactions = self.store.list_transactions(person.id).await?;
                Ok(DashboardSummary::from_transactions(transactions, recent_limit))
            }
            None => Ok(DashboardSummary::default()),
        }
    }
}

/// Person row of the signed-in identity, without creating one
pub(crate) async fn current_person(
    store: &dyn DataStore,
    auth: &AuthService,
) -> Result<Option<Person>> {
    let identity = auth.require_identity()?;
    store.find_person_by_email(&identity.email).await
}
