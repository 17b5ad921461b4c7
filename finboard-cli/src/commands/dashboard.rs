//! Dashboard command - totals and recent transactions

use anyhow::Result;
use colored::Colorize;

use finboard_core::services::Route;
use finboard_core::{FinboardContext, LoggingService, OperationResult};

use super::{get_context, get_logger, open_page};
use crate::output;

pub async fn run(limit: usize, json: bool) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context().await?;
    show(&ctx, &logger, limit, json).await
}

/// Render the dashboard page on an existing context
pub async fn show(
    ctx: &FinboardContext,
    logger: &Option<LoggingService>,
    limit: usize,
    json: bool,
) -> Result<()> {
    open_page(ctx, Route::Dashboard, logger).await?;

    let summary = ctx.dashboard_service.summary(limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&OperationResult::ok(&summary))?);
        return Ok(());
    }

    println!("{}", "Dashboard".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Income".to_string(), output::format_amount(summary.total_income)]);
    table.add_row(vec!["Expenses".to_string(), output::format_amount(summary.total_expense)]);
    table.add_row(vec!["Net".to_string(), output::format_amount(summary.net)]);
    table.add_row(vec!["Transactions".to_string(), summary.transaction_count.to_string()]);
    println!("{}", table);

    if summary.recent.is_empty() {
        println!();
        println!("No transactions yet. Add one with 'fb income add' or 'fb expense add'.");
        return Ok(());
    }

    println!();
    println!("{}", "Recent Transactions".bold());
    println!("{}", output::transaction_table(&summary.recent));
    Ok(())
}
