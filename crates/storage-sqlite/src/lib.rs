//! SQLite storage implementation for WealthDesk.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `wealthdesk-core` and contains:
//! - Database connection pooling and the single writer actor
//! - Diesel migrations
//! - Repository implementations for fee schedules, groups, accounts and quarters
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! The core crate is database-agnostic and works with traits.
//!
//! ```text
//!   core (domain)       server (HTTP)
//!         │                  │
//!         └────────┬─────────┘
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod accounts;
pub mod billing;
pub mod fee_schedules;
pub mod groups;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from wealthdesk-core for convenience
pub use wealthdesk_core::errors::{DatabaseError, Error, Result};
