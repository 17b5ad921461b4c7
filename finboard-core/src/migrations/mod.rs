//! Schema and seed catalog of the offline store, embedded with include_str!

/// Applied in order by `MigrationService`; append new files, never edit old ones
pub const MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
    ("002_default_catalog.sql", include_str!("002_default_catalog.sql")),
];
