//! Account roster CSV.
//!
//! `Account Number,Description,First Name,Last Name,Custodian,Billable,Discretionary`.
//! The owning client is matched by first and last name; the flags are
//! `true` (any case) or anything else for false.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::accounts_model::Account;
use crate::errors::{BillingError, Result};
use crate::groups::Client;
use crate::utils::csv_utils::{field, read_records, write_rows};

pub const ACCOUNT_CSV_HEADER: [&str; 7] = [
    "Account Number",
    "Description",
    "First Name",
    "Last Name",
    "Custodian",
    "Billable",
    "Discretionary",
];

/// A parsed account roster line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountImportRow {
    pub line: usize,
    pub account_number: String,
    pub description: Option<String>,
    pub client_first_name: String,
    pub client_last_name: String,
    pub custodian: Option<String>,
    pub billable: bool,
    pub discretionary: bool,
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Parses every line. A line without an account number aborts the import.
pub fn parse_accounts_csv(content: &str) -> Result<Vec<AccountImportRow>> {
    read_records(content)?
        .into_iter()
        .map(|(line, record)| {
            let account_number = field(&record, 0, line, "account number")?.to_string();
            if account_number.is_empty() {
                return Err(BillingError::Import {
                    line,
                    message: "account number is empty".to_string(),
                }
                .into());
            }
            Ok(AccountImportRow {
                line,
                account_number,
                description: optional(field(&record, 1, line, "description")?),
                client_first_name: field(&record, 2, line, "first name")?.to_string(),
                client_last_name: field(&record, 3, line, "last name")?.to_string(),
                custodian: optional(field(&record, 4, line, "custodian")?),
                billable: flag(field(&record, 5, line, "billable")?),
                discretionary: flag(field(&record, 6, line, "discretionary")?),
            })
        })
        .collect()
}

/// Writes accounts in the roster format, so an export can be re-imported.
pub fn write_accounts_csv(accounts: &[Account], clients: &[Client]) -> Result<String> {
    let clients: HashMap<&str, &Client> = clients.iter().map(|c| (c.id.as_str(), c)).collect();
    let rows = accounts
        .iter()
        .map(|account| {
            let client = account
                .client_id
                .as_deref()
                .and_then(|id| clients.get(id).copied());
            vec![
                account.account_number.clone(),
                account.description.clone().unwrap_or_default(),
                client.map(|c| c.first_name.clone()).unwrap_or_default(),
                client.map(|c| c.last_name.clone()).unwrap_or_default(),
                account.custodian.clone().unwrap_or_default(),
                account.billable.to_string(),
                account.discretionary.to_string(),
            ]
        })
        .collect();
    write_rows(&ACCOUNT_CSV_HEADER, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    #[test]
    fn test_parse_accounts_csv() {
        let csv = "Account Number,Description,First Name,Last Name,Custodian,Billable,Discretionary\n\
                   100-A,Smith IRA,Ann,Smith,Schwab,TRUE,false\n\
                   100-B,,Ann,Smith,,yes,True\n";
        let rows = parse_accounts_csv(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].description.as_deref(), Some("Smith IRA"));
        assert_eq!(rows[0].custodian.as_deref(), Some("Schwab"));
        assert!(rows[0].billable);
        assert!(!rows[0].discretionary);
        assert_eq!(rows[1].description, None);
        assert!(!rows[1].billable);
        assert!(rows[1].discretionary);
    }

    #[test]
    fn test_parse_accounts_csv_rejects_short_line() {
        let csv = "Account Number,Description,First Name,Last Name,Custodian,Billable,Discretionary\n\
                   100-A,Smith IRA,Ann\n";
        let err = parse_accounts_csv(csv).unwrap_err();
        assert!(matches!(err, Error::Billing(BillingError::Import { line: 2, .. })));
    }
}
