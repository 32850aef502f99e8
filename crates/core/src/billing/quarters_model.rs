//! Quarter domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{invalid_input, Error, Result};

/// Position of a quarter in the roll-up pipeline.
///
/// Variants are declared in pipeline order so `Ord` answers "has this step
/// already run".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuarterStatus {
    /// Some grouped account snapshots are not linked to a group snapshot yet
    #[default]
    Open,
    /// Every grouped account snapshot is linked
    SnapshotsLinked,
    /// Group snapshot fees are evaluated
    GroupFeesComputed,
    /// Group fees are allocated down to the accounts
    AccountFeesAllocated,
}

impl QuarterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuarterStatus::Open => "OPEN",
            QuarterStatus::SnapshotsLinked => "SNAPSHOTS_LINKED",
            QuarterStatus::GroupFeesComputed => "GROUP_FEES_COMPUTED",
            QuarterStatus::AccountFeesAllocated => "ACCOUNT_FEES_ALLOCATED",
        }
    }
}

impl fmt::Display for QuarterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuarterStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "OPEN" => Ok(QuarterStatus::Open),
            "SNAPSHOTS_LINKED" => Ok(QuarterStatus::SnapshotsLinked),
            "GROUP_FEES_COMPUTED" => Ok(QuarterStatus::GroupFeesComputed),
            "ACCOUNT_FEES_ALLOCATED" => Ok(QuarterStatus::AccountFeesAllocated),
            other => Err(invalid_input(format!("Unknown quarter status '{}'", other))),
        }
    }
}

/// A billing period.
///
/// `aum` and `fee` are cached totals over the quarter's snapshots. `version`
/// increases on every saved change and guards against lost updates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quarter {
    pub id: String,
    pub name: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub aum: Decimal,
    pub fee: Decimal,
    pub status: QuarterStatus,
    pub version: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuarter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

impl NewQuarter {
    pub fn validate(&self) -> Result<()> {
        validate_period(&self.name, self.from_date, self.to_date)
    }
}

/// Renames a quarter or moves its dates. Totals are never set directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterUpdate {
    pub id: Option<String>,
    pub name: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

impl QuarterUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.id.is_none() {
            return Err(invalid_input("Quarter ID is required for updates"));
        }
        validate_period(&self.name, self.from_date, self.to_date)
    }
}

fn validate_period(name: &str, from_date: NaiveDate, to_date: NaiveDate) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid_input("Quarter name cannot be empty"));
    }
    if from_date > to_date {
        return Err(invalid_input(format!(
            "Quarter starts after it ends ({} > {})",
            from_date, to_date
        )));
    }
    Ok(())
}
