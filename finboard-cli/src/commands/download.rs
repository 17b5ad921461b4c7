//! Download command - export transactions to a file

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use finboard_core::services::{DateRange, ExportFormat, Route};
use finboard_core::{EventKind, LogEvent, OperationResult};

use super::{get_context, get_logger, log_event, open_page};
use crate::output;

fn parse_date(flag: &str, value: Option<String>) -> Result<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .with_context(|| format!("--{} must be a date in YYYY-MM-DD format", flag))
        })
        .transpose()
}

pub async fn run(
    format: String,
    from: Option<String>,
    to: Option<String>,
    out: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context().await?;
    open_page(&ctx, Route::Downloads, &logger).await?;

    let format: ExportFormat = format.parse()?;
    let range = DateRange::new(parse_date("from", from)?, parse_date("to", to)?)?;

    let export = ctx.download_service.export(format, range).await?;
    let dir = match out {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };
    let path = export.save(&dir)?;

    log_event(
        &logger,
        LogEvent::new(EventKind::ExportWritten).with_route(Route::Downloads),
    );

    if json {
        let data = serde_json::json!({
            "path": path.to_string_lossy(),
            "format": export.format,
            "rows": export.rows,
        });
        println!("{}", serde_json::to_string_pretty(&OperationResult::ok(data))?);
        return Ok(());
    }

    output::success(&format!(
        "Exported {} transactions ({}) to {}",
        export.rows,
        output::format_size(export.bytes.len() as u64),
        path.display()
    ));
    Ok(())
}
