//! Add income / add expense pages

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, error};

use crate::domain::result::{Error, Result};
use crate::domain::{Direction, Person, Transaction, TransactionType};
use crate::ports::DataStore;
use crate::services::auth::AuthService;
use crate::services::navigation::Route;

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields";

/// Amounts are stored as DECIMAL(15, 2)
const AMOUNT_SCALE: u32 = 2;
const AMOUNT_INTEGER_DIGITS: u32 = 13;

/// Time the success message stays up before the page redirects
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(2000);

/// Raw form fields as typed by the user
#[derive(Debug, Clone, Default)]
pub struct EntryForm {
    pub amount: String,
    pub type_id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub description: String,
}

/// Successful submission: what was stored and where to go next
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub transaction: Transaction,
    pub message: String,
    pub redirect_to: Route,
    pub redirect_after: Duration,
}

pub struct EntryService {
    store: Arc<dyn DataStore>,
    auth: Arc<AuthService>,
    redirect_delay: Duration,
}

impl EntryService {
    pub fn new(store: Arc<dyn DataStore>, auth: Arc<AuthService>, redirect_delay: Duration) -> Self {
        Self {
            store,
            auth,
            redirect_delay,
        }
    }

    /// The person row of the signed-in identity, created on first use
    pub async fn resolve_person(&self) -> Result<Person> {
        let identity = self.auth.require_identity()?;
        self.store.upsert_person(&identity.email).await
    }

    /// Type options for the page's direction
    pub async fn load_types(&self, direction: Direction) -> Result<Vec<TransactionType>> {
        self.store.list_types(direction).await.map_err(logged)
    }

    /// Validate the form and store one transaction.
    ///
    /// Missing fields fail before anything touches the store.
    pub async fn submit(&self, direction: Direction, form: &EntryForm) -> Result<SubmitOutcome> {
        let (amount, type_id, date) = parse_form(form)?;
        self.auth.require_identity()?;

        let types = self.load_types(direction).await?;
        if !types.iter().any(|t| t.id == type_id) {
            return Err(Error::validation(format!(
                "Please select a valid {} type",
                direction.as_str()
            )));
        }

        let person = self.resolve_person().await.map_err(logged)?;
        let transaction = Transaction::new(person.id, type_id, amount, date)
            .with_description(form.description.as_str());
        let stored = self
            .store
            .insert_transaction(&transaction)
            .await
            .map_err(logged)?;
        debug!(direction = direction.as_str(), "transaction stored");

        Ok(SubmitOutcome {
            transaction: stored,
            message: format!("{} added successfully!", direction.label()),
            redirect_to: Route::Dashboard,
            redirect_after: self.redirect_delay,
        })
    }
}

fn parse_form(form: &EntryForm) -> Result<(Decimal, i64, NaiveDate)> {
    let amount = form.amount.trim();
    let type_id = form.type_id.trim();
    let date = form.date.trim();

    if amount.is_empty() || type_id.is_empty() || date.is_empty() {
        return Err(Error::validation(REQUIRED_FIELDS_MESSAGE));
    }

    let amount = Decimal::from_str(amount)
        .ok()
        .filter(|a| *a > Decimal::ZERO)
        .ok_or_else(|| Error::validation("Amount must be a positive number"))?;
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(Error::validation("Amount can have at most 2 decimal places"));
    }
    if amount.trunc() >= Decimal::from(10_i64.pow(AMOUNT_INTEGER_DIGITS)) {
        return Err(Error::validation("Amount is too large"));
    }
    let type_id = type_id
        .parse::<i64>()
        .map_err(|_| Error::validation("Please select a valid type"))?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| Error::validation("Date must be in YYYY-MM-DD format"))?;

    Ok((amount, type_id, date))
}

/// Log failures that will only reach the page as the generic message
fn logged(e: Error) -> Error {
    if !matches!(e, Error::Validation(_) | Error::Authentication(_)) {
        error!(error = %e, "entry page request failed");
    }
    e
}
