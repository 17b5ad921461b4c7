//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. The auth service
//! owns the session state; guard and navigation read it; each page service
//! covers one dashboard page.

pub mod auth;
pub mod bill;
pub mod dashboard;
mod demo;
pub mod download;
pub mod entry;
pub mod guard;
pub mod logging;
pub mod migration;
pub mod navigation;
pub mod privilege;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AuthPhase, AuthService, AuthState, SignUpOutcome};
pub use bill::BillService;
pub use dashboard::{DashboardService, DashboardSummary};
pub use demo::{DemoService, OFFLINE_DB};
pub use download::{DateRange, DownloadService, Export, ExportFormat};
pub use entry::{EntryForm, EntryService, SubmitOutcome};
pub use guard::{GuardDecision, GuardState, RouteGuard};
pub use logging::{EventKind, LogEntry, LogEvent, LogFilter, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use navigation::{can_access, visible_entries, NavItem, Route};
pub use privilege::{PrivilegeResolution, PrivilegeResolver, PrivilegeSource};
pub use report::{Report, ReportService};
