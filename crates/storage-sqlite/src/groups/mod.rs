//! SQLite storage implementation for billing groups and clients.

mod model;
mod repository;

pub use model::{ClientDB, GroupDB};
pub use repository::GroupRepository;
