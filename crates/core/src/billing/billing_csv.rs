//! Custodian value uploads and quarter exports.

use std::collections::HashMap;

use chrono::NaiveDate;
use csv::StringRecord;
use rust_decimal::Decimal;

use super::quarter_ledger::QuarterLedger;
use super::snapshots_model::QuarterExport;
use crate::errors::{BillingError, Result};
use crate::utils::decimal_utils::normalize_market_value;
use crate::utils::csv_utils::{field, parse_date_field, parse_decimal_field, read_records, write_rows};

pub const GROUP_EXPORT_HEADER: [&str; 3] = ["Group", "Market Value", "Fee"];

pub const ACCOUNT_EXPORT_HEADER: [&str; 8] = [
    "Client Name",
    "Account Number",
    "Group Name",
    "Group Market Value",
    "Account Market Value",
    "Account Weight",
    "Group Fee",
    "Account Fee",
];

const DATE_COLUMN: usize = 0;
const ACCOUNT_NUMBER_COLUMN: usize = 1;
const MARKET_VALUE_COLUMN: usize = 4;

/// One data row of a custodian values file.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountValueRow {
    pub line: usize,
    pub snapshot_date: NaiveDate,
    pub account_number: String,
    pub market_value: Decimal,
}

/// Parses a custodian values file: a header line, then
/// `date,account_number,_,_,market_value` rows. Extra columns are ignored.
///
/// A malformed row fails the whole file.
pub fn parse_account_values_csv(content: &str) -> Result<Vec<AccountValueRow>> {
    read_records(content)?
        .into_iter()
        .map(|(line, record)| {
            Ok(AccountValueRow {
                line,
                snapshot_date: parse_date_field(&record, DATE_COLUMN, line, "date")?,
                account_number: field(&record, ACCOUNT_NUMBER_COLUMN, line, "account number")?
                    .to_string(),
                market_value: parse_market_value(&record, line)?,
            })
        })
        .collect()
}

fn parse_market_value(record: &StringRecord, line: usize) -> Result<Decimal> {
    let value = parse_decimal_field(record, MARKET_VALUE_COLUMN, line, "market value")?;
    normalize_market_value(value).map_err(|e| {
        BillingError::Import {
            line,
            message: e.to_string(),
        }
        .into()
    })
}

/// Renders the group and account export files for a quarter.
///
/// `client_names` maps account ids to the owning client's display name;
/// accounts without a client get an empty cell.
pub fn write_quarter_export(
    ledger: &QuarterLedger,
    client_names: &HashMap<String, String>,
) -> Result<QuarterExport> {
    let group_rows = ledger
        .group_snapshots()
        .iter()
        .map(|gs| {
            vec![
                gs.group_name.clone(),
                gs.market_value.to_string(),
                gs.fee.to_string(),
            ]
        })
        .collect();

    let account_rows = ledger
        .account_snapshots()
        .iter()
        .map(|snapshot| {
            let group = snapshot
                .group_snapshot_id
                .as_deref()
                .and_then(|id| ledger.group_snapshot(id));
            vec![
                client_names
                    .get(&snapshot.account_id)
                    .cloned()
                    .unwrap_or_default(),
                snapshot.account_number.clone(),
                group.map(|gs| gs.group_name.clone()).unwrap_or_default(),
                group.map(|gs| gs.market_value.to_string()).unwrap_or_default(),
                snapshot.market_value.to_string(),
                snapshot
                    .group_weight
                    .map(|w| w.to_string())
                    .unwrap_or_default(),
                group.map(|gs| gs.fee.to_string()).unwrap_or_default(),
                snapshot.fee.to_string(),
            ]
        })
        .collect();

    Ok(QuarterExport {
        groups_csv: write_rows(&GROUP_EXPORT_HEADER, group_rows)?,
        accounts_csv: write_rows(&ACCOUNT_EXPORT_HEADER, account_rows)?,
    })
}
