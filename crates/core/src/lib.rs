//! WealthDesk Core - billing domain entities, services, and traits.
//!
//! This crate contains the fee engine and the quarterly billing roll-up.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod accounts;
pub mod billing;
pub mod constants;
pub mod errors;
pub mod fee_schedules;
pub mod groups;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
