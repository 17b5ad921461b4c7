//! Sample data for offline mode
//!
//! Generates 90 days of transactions against the seeded catalog:
//! - monthly salary and rent, a quarterly dividend
//! - weekly groceries and fuel, monthly utilities and streaming
//! - a sprinkling of dining out and freelance work

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::Transaction;

// Type ids from the default catalog migration
const SALARY: i64 = 1;
const FREELANCE: i64 = 3;
const DIVIDENDS: i64 = 4;
const RENT: i64 = 7;
const GROCERIES: i64 = 9;
const DINING_OUT: i64 = 10;
const FUEL: i64 = 11;
const ELECTRICITY: i64 = 13;
const INTERNET: i64 = 14;
const STREAMING: i64 = 15;

const DAYS: i64 = 90;

/// Generate sample transactions for `person_id`, ending at `today`
pub fn generate_demo_transactions(person_id: Uuid, today: NaiveDate) -> Vec<Transaction> {
    let mut transactions = Vec::new();
    let mut push = |type_id: i64, cents: i64, date: NaiveDate, description: &str| {
        transactions.push(
            Transaction::new(person_id, type_id, Decimal::new(cents, 2), date)
                .with_description(description),
        );
    };

    for offset in (0..DAYS).rev() {
        let date = today - Duration::days(offset);
        let day = date.day();
        let weekday = date.weekday().num_days_from_monday();

        if day == 1 {
            push(SALARY, 425_000, date, "Monthly salary");
            push(RENT, 145_000, date, "Apartment rent");
            if date.month() % 3 == 1 {
                push(DIVIDENDS, 8_734, date, "Index fund dividend");
            }
        }
        if day == 5 {
            push(ELECTRICITY, 6_000 + (date.month() as i64 * 431) % 2_500, date, "Power bill");
            push(INTERNET, 5_999, date, "Fiber internet");
        }
        if day == 12 {
            push(STREAMING, 1_599, date, "Streaming subscription");
        }
        if day == 20 && date.month() % 2 == 0 {
            push(FREELANCE, 60_000, date, "Design contract");
        }

        // Saturday shop, Monday fuel
        if weekday == 5 {
            push(GROCERIES, 8_500 + (day as i64 * 373) % 4_000, date, "Weekly groceries");
        }
        if weekday == 0 {
            push(FUEL, 4_200 + (day as i64 * 157) % 1_800, date, "Fuel");
        }
        if weekday == 4 && day % 2 == 0 {
            push(DINING_OUT, 3_800 + (day as i64 * 211) % 3_000, date, "Dinner out");
        }
    }

    transactions
}
