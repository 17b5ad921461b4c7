//! Report command - category and monthly totals

use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, CellAlignment};

use finboard_core::services::report::CategoryTotal;
use finboard_core::services::Route;
use finboard_core::OperationResult;

use super::{get_context, get_logger, open_page};
use crate::output;

fn print_categories(title: &str, totals: &[CategoryTotal]) {
    println!("{}", title.bold());
    if totals.is_empty() {
        println!("  {}", "Nothing recorded".dimmed());
        return;
    }
    let mut table = output::create_table();
    table.set_header(vec!["Category", "Transactions", "Total"]);
    for total in totals {
        table.add_row(vec![
            Cell::new(&total.category),
            Cell::new(total.count).set_alignment(CellAlignment::Right),
            output::amount_cell(total.direction, total.total),
        ]);
    }
    println!("{}", table);
}

pub async fn run(json: bool) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context().await?;
    open_page(&ctx, Route::Reports, &logger).await?;

    let report = ctx.report_service.build().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&OperationResult::ok(&report))?);
        return Ok(());
    }

    print_categories("Income by Category", &report.income_by_category);
    println!();
    print_categories("Expenses by Category", &report.expense_by_category);
    println!();

    println!("{}", "Monthly".bold());
    let mut table = output::create_table();
    table.set_header(vec!["Month", "Income", "Expenses", "Net"]);
    for month in &report.monthly {
        table.add_row(vec![
            Cell::new(&month.month),
            Cell::new(output::format_amount(month.income)).set_alignment(CellAlignment::Right),
            Cell::new(output::format_amount(month.expense)).set_alignment(CellAlignment::Right),
            Cell::new(output::format_amount(month.net)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{}", table);
    Ok(())
}
