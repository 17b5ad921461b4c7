//! Income and expense commands - the two entry pages

use anyhow::{anyhow, Result};
use chrono::Local;
use clap::Subcommand;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};

use finboard_core::services::dashboard::DEFAULT_RECENT_LIMIT;
use finboard_core::services::{EntryForm, Route};
use finboard_core::{
    Direction, EventKind, FinboardContext, LogEvent, LoggingService, OperationResult,
    TransactionType,
};

use super::{dashboard, get_context, get_logger, log_event, open_page};
use crate::output;

#[derive(Subcommand)]
pub enum EntryCommands {
    /// Add a transaction
    Add {
        /// Amount (positive)
        #[arg(long)]
        amount: Option<String>,
        /// Transaction type id (see the `types` subcommand)
        #[arg(long = "type")]
        type_id: Option<String>,
        /// Date as YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Optional description
        #[arg(long, short)]
        description: Option<String>,
        /// Don't show the dashboard afterwards
        #[arg(long)]
        no_redirect: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the transaction types that can be selected
    Types {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn route_for(direction: Direction) -> Route {
    match direction {
        Direction::Income => Route::AddIncome,
        Direction::Expense => Route::AddExpense,
    }
}

pub async fn run(direction: Direction, command: EntryCommands) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context().await?;
    open_page(&ctx, route_for(direction), &logger).await?;

    match command {
        EntryCommands::Types { json } => {
            let types = ctx.entry_service.load_types(direction).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&types)?);
                return Ok(());
            }
            let mut table = output::create_table();
            table.set_header(vec!["Id", "Type"]);
            for t in types {
                table.add_row(vec![t.id.to_string(), t.name]);
            }
            println!("{}", table);
            Ok(())
        }
        EntryCommands::Add {
            amount,
            type_id,
            date,
            description,
            no_redirect,
            json,
        } => {
            let interactive = !json && atty::is(atty::Stream::Stdin);
            let form = if interactive {
                let types = ctx.entry_service.load_types(direction).await?;
                prompt_form(amount, type_id, date, description, &types)?
            } else {
                EntryForm {
                    amount: amount.unwrap_or_default(),
                    type_id: type_id.unwrap_or_default(),
                    date: date.unwrap_or_else(today),
                    description: description.unwrap_or_default(),
                }
            };

            submit(&ctx, &logger, direction, &form, no_redirect, json).await
        }
    }
}

async fn submit(
    ctx: &FinboardContext,
    logger: &Option<LoggingService>,
    direction: Direction,
    form: &EntryForm,
    no_redirect: bool,
    json: bool,
) -> Result<()> {
    let outcome = match ctx.entry_service.submit(direction, form).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log_event(
                logger,
                LogEvent::new(EventKind::EntryFailed)
                    .with_route(route_for(direction))
                    .with_error(e.kind()),
            );
            if json {
                let result: OperationResult<()> = OperationResult::fail(e.page_message());
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            return Err(anyhow!(e.page_message()));
        }
    };

    log_event(
        logger,
        LogEvent::new(EventKind::EntryAdded).with_route(route_for(direction)),
    );

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&OperationResult::ok(&outcome.transaction))?
        );
        return Ok(());
    }

    output::success(&outcome.message);
    if no_redirect {
        return Ok(());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    spinner.set_message(format!("Returning to {}...", outcome.redirect_to.title()));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    tokio::time::sleep(outcome.redirect_after).await;
    spinner.finish_and_clear();

    dashboard::show(ctx, logger, DEFAULT_RECENT_LIMIT, false).await
}

fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Fill in missing fields interactively
fn prompt_form(
    amount: Option<String>,
    type_id: Option<String>,
    date: Option<String>,
    description: Option<String>,
    types: &[TransactionType],
) -> Result<EntryForm> {
    let amount = match amount {
        Some(amount) => amount,
        None => Input::new()
            .with_prompt("Amount")
            .allow_empty(true)
            .interact_text()?,
    };

    let type_id = match type_id {
        Some(type_id) => type_id,
        None if types.is_empty() => String::new(),
        None => {
            let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
            let index = Select::new()
                .with_prompt("Type")
                .items(&names)
                .default(0)
                .interact()?;
            types[index].id.to_string()
        }
    };

    let date = match date {
        Some(date) => date,
        None => Input::new()
            .with_prompt("Date")
            .default(today())
            .interact_text()?,
    };

    let description = match description {
        Some(description) => description,
        None => Input::new()
            .with_prompt("Description")
            .allow_empty(true)
            .interact_text()?,
    };

    Ok(EntryForm {
        amount,
        type_id,
        date,
        description,
    })
}
