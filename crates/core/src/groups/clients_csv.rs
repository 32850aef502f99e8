//! Client roster CSV: `First Name,Middle Name,Last Name,Email,Group`.
//!
//! A group named in the file that does not exist yet is created on import.
//! An empty group cell leaves the client ungrouped.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::groups_model::{Client, Group};
use crate::errors::{BillingError, Result};
use crate::utils::csv_utils::{field, read_records, write_rows};

pub const CLIENT_CSV_HEADER: [&str; 5] = ["First Name", "Middle Name", "Last Name", "Email", "Group"];

/// A parsed client roster line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientImportRow {
    pub line: usize,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: Option<String>,
    pub group_name: Option<String>,
}

fn optional_field(record: &csv::StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Parses every line. A line missing the first or last name aborts the import.
pub fn parse_clients_csv(content: &str) -> Result<Vec<ClientImportRow>> {
    read_records(content)?
        .into_iter()
        .map(|(line, record)| {
            let first_name = field(&record, 0, line, "first name")?.to_string();
            let last_name = field(&record, 2, line, "last name")?.to_string();
            if first_name.is_empty() || last_name.is_empty() {
                return Err(BillingError::Import {
                    line,
                    message: "client first and last name are required".to_string(),
                }
                .into());
            }
            Ok(ClientImportRow {
                line,
                first_name,
                middle_name: optional_field(&record, 1),
                last_name,
                email: optional_field(&record, 3),
                group_name: optional_field(&record, 4),
            })
        })
        .collect()
}

pub fn write_clients_csv(clients: &[Client], groups: &[Group]) -> Result<String> {
    let group_names: HashMap<&str, &str> = groups
        .iter()
        .map(|g| (g.id.as_str(), g.name.as_str()))
        .collect();
    let rows = clients
        .iter()
        .map(|client| {
            vec![
                client.first_name.clone(),
                client.middle_name.clone().unwrap_or_default(),
                client.last_name.clone(),
                client.email.clone().unwrap_or_default(),
                client
                    .group_id
                    .as_deref()
                    .and_then(|id| group_names.get(id))
                    .map(|name| name.to_string())
                    .unwrap_or_default(),
            ]
        })
        .collect();
    write_rows(&CLIENT_CSV_HEADER, rows)
}
