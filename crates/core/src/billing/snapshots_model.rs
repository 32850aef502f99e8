//! Snapshot models: per-quarter market values of groups and accounts.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{invalid_input, Result};
use crate::utils::decimal_utils::check_money;

/// One group's aggregate for a quarter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupSnapshot {
    pub id: String,
    pub quarter_id: String,
    pub group_id: String,
    pub group_name: String,
    /// Copied from the group when the snapshot is created.
    pub fee_schedule_id: Option<String>,
    /// Cached sum of the linked account snapshots.
    pub market_value: Decimal,
    pub fee: Decimal,
}

/// One account's market value for a quarter.
///
/// `billable` and `fee_schedule_id` are copied from the account when the
/// snapshot is taken, so later edits to the account do not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    pub id: String,
    pub quarter_id: String,
    pub account_id: String,
    pub account_number: String,
    pub group_id: Option<String>,
    pub group_snapshot_id: Option<String>,
    pub snapshot_date: NaiveDate,
    pub market_value: Decimal,
    pub billable: bool,
    pub fee_schedule_id: Option<String>,
    /// Share of the group market value; `None` until allocated or when
    /// the account is not billable.
    pub group_weight: Option<Decimal>,
    pub fee: Decimal,
}

impl AccountSnapshot {
    /// Not linked to a group snapshot, so its own fee counts toward the
    /// quarter total.
    pub fn is_standalone(&self) -> bool {
        self.group_snapshot_id.is_none()
    }

    /// Belongs to a group but has not been linked to its group snapshot.
    pub fn is_pending_link(&self) -> bool {
        self.group_id.is_some() && self.group_snapshot_id.is_none()
    }
}

/// Manual entry of one account value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccountSnapshot {
    pub account_id: String,
    pub snapshot_date: NaiveDate,
    pub market_value: Decimal,
}

impl NewAccountSnapshot {
    pub fn validate(&self) -> Result<()> {
        if self.account_id.trim().is_empty() {
            return Err(invalid_input("Account ID is required for a snapshot"));
        }
        check_money(self.market_value, "market value")
    }
}

/// A cached total that disagrees with the recomputation from child rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    /// `quarter.aum`, `quarter.fee` or `group_snapshot.market_value`
    pub field: String,
    pub entity_id: String,
    pub cached: Decimal,
    pub recomputed: Decimal,
}

/// A data row of an upload that was not applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    pub line: usize,
    pub account_number: String,
    pub reason: String,
}

/// Outcome of an account values or account roster upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: Vec<SkippedRow>,
}

/// The two files produced by a quarter export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuarterExport {
    pub groups_csv: String,
    pub accounts_csv: String,
}
