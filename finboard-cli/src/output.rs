//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, ContentArrangement, Table};
use rust_decimal::Decimal;

use finboard_core::{Direction, TransactionDetail};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Two decimal places, thousands left alone
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// Right-aligned amount cell, signed and colored by direction
pub fn amount_cell(direction: Direction, amount: Decimal) -> Cell {
    let text = match direction {
        Direction::Income => format!("+{}", format_amount(amount)).green().to_string(),
        Direction::Expense => format!("-{}", format_amount(amount)).red().to_string(),
    };
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Table of transactions, newest first as given
pub fn transaction_table(transactions: &[TransactionDetail]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Date", "Type", "Category", "Amount", "Description"]);
    for tx in transactions {
        table.add_row(vec![
            Cell::new(tx.transaction_date.format("%Y-%m-%d")),
            Cell::new(&tx.type_name),
            Cell::new(&tx.category_name),
            amount_cell(tx.direction, tx.amount),
            Cell::new(tx.description.as_deref().unwrap_or("")),
        ]);
    }
    table
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
