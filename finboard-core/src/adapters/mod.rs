//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Supabase-style REST client for DataStore, BlobStorage and the remote SessionBackend
//! - DuckDB for the offline DataStore
//! - Local filesystem for BlobStorage and KeyValueStore
//! - Fixed test credential for the local SessionBackend
//! - Demo data for offline mode

pub mod demo;
pub mod duckdb;
pub mod file_storage;
pub mod local_auth;
pub mod local_storage;
pub mod supabase;

#[cfg(test)]
pub mod supabase_mock;
