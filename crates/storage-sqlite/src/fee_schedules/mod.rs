//! SQLite storage implementation for fee schedules and their rules.

mod model;
mod repository;

pub use model::{FeeRuleDB, FeeScheduleDB};
pub use repository::FeeScheduleRepository;
