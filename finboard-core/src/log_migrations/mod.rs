//! Schema of logs.duckdb, embedded with include_str!

/// Applied in order by `MigrationService`; append new files, never edit old ones
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_event_log.sql", include_str!("001_event_log.sql")),
];
