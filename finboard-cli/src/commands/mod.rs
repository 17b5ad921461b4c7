//! CLI command implementations

pub mod auth;
pub mod bills;
pub mod dashboard;
pub mod download;
pub mod entry;
pub mod logs;
pub mod nav;
pub mod offline;
pub mod report;

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use finboard_core::services::{GuardDecision, Route, RouteGuard};
use finboard_core::{EventKind, FinboardContext, LogEvent, LoggingService};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let finboard_dir = get_finboard_dir().ok()?;
    std::fs::create_dir_all(&finboard_dir).ok()?;
    LoggingService::new(&finboard_dir, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the finboard directory from environment or default
pub fn get_finboard_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("FINBOARD_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".finboard"))
        .ok_or_else(|| anyhow!("Could not find home directory; set FINBOARD_DIR"))
}

/// Build the context for the configured auth mode and restore any session
pub async fn get_context() -> Result<FinboardContext> {
    let finboard_dir = get_finboard_dir()?;

    std::fs::create_dir_all(&finboard_dir)
        .with_context(|| format!("Failed to create finboard directory: {:?}", finboard_dir))?;

    let ctx = FinboardContext::new(&finboard_dir).context("Failed to initialize finboard context")?;

    // A failed restore leaves the context signed out; pages then redirect to login
    if let Err(e) = ctx.auth.initialize().await {
        tracing::warn!("Session restore failed: {}", e);
    }

    Ok(ctx)
}

/// Run the route guard for `route` and refuse to continue unless it renders
pub async fn open_page(
    ctx: &FinboardContext,
    route: Route,
    logger: &Option<LoggingService>,
) -> Result<()> {
    let mut rx = ctx.auth.subscribe();
    let mut guard = RouteGuard::new(route);

    match guard.settle(&mut rx).await {
        GuardDecision::Render => {
            log_event(
                logger,
                LogEvent::new(EventKind::PageOpened)
                    .with_route(route)
                    .with_backend(ctx.auth.backend_name()),
            );
            Ok(())
        }
        GuardDecision::Forbidden(key) => {
            log_event(
                logger,
                LogEvent::new(EventKind::PageForbidden)
                    .with_route(route)
                    .with_privilege(key),
            );
            bail!("You don't have access to {} ({} is not granted)", route.title(), key.as_str())
        }
        GuardDecision::Redirect(to) => {
            bail!("Not signed in. Run 'fb login' first ({}).", to.path())
        }
        GuardDecision::Blocked => bail!("Not signed in. Run 'fb login' first."),
        GuardDecision::Placeholder => bail!("Session is still loading. Try again."),
    }
}
