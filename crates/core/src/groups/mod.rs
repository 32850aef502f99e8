//! Groups module - billing households and their clients.

mod clients_csv;
mod groups_model;
mod groups_service;
mod groups_traits;

pub use clients_csv::{parse_clients_csv, write_clients_csv, ClientImportRow, CLIENT_CSV_HEADER};
pub use groups_model::{Client, ClientUpdate, Group, GroupUpdate, NewClient, NewGroup};
pub use groups_service::GroupService;
pub use groups_traits::{GroupRepositoryTrait, GroupServiceTrait};

#[cfg(test)]
mod groups_service_tests;
