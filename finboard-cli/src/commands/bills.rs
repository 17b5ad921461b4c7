//! Bills command - upload and list receipts

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Subcommand;

use finboard_core::services::Route;
use finboard_core::{EventKind, LogEvent, OperationResult};

use super::{get_context, get_logger, log_event, open_page};
use crate::output;

#[derive(Subcommand)]
pub enum BillsCommands {
    /// Upload a receipt (pdf, png, jpg, jpeg, gif, webp; up to 10 MB)
    Upload {
        /// Path to the receipt file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List uploaded receipts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(command: BillsCommands) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context().await?;
    open_page(&ctx, Route::Bills, &logger).await?;

    match command {
        BillsCommands::Upload { file, json } => {
            let bill = match ctx.bill_service.upload(&file).await {
                Ok(bill) => bill,
                Err(e) => {
                    log_event(
                        &logger,
                        LogEvent::new(EventKind::BillUploadFailed)
                            .with_route(Route::Bills)
                            .with_error(e.kind()),
                    );
                    return Err(anyhow!(e.page_message()));
                }
            };
            log_event(
                &logger,
                LogEvent::new(EventKind::BillUploaded).with_route(Route::Bills),
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&OperationResult::ok(&bill))?);
            } else {
                output::success(&format!("Uploaded {} as {}", bill.name, bill.path));
            }
        }
        BillsCommands::List { json } => {
            let bills = ctx.bill_service.list().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&bills)?);
                return Ok(());
            }
            if bills.is_empty() {
                println!("No bills uploaded yet.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Uploaded", "Name", "Type", "Path"]);
            for bill in bills {
                table.add_row(vec![
                    bill.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    bill.name,
                    bill.mime,
                    bill.path,
                ]);
            }
            println!("{}", table);
        }
    }

    Ok(())
}
