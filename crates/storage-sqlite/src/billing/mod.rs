//! SQLite storage implementation for quarters and their snapshots.

mod model;
mod repository;

pub use model::{AccountSnapshotDB, GroupSnapshotDB, QuarterDB};
pub use repository::BillingRepository;
