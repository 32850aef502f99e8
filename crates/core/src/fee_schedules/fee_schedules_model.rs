//! Fee schedule domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::fee_calculator::calculate_fee;
use crate::errors::{invalid_input, Result};
use crate::utils::decimal_utils::{check_money, check_rate};

/// A named, tiered fee schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    pub id: String,
    pub name: String,
    pub rules: Vec<FeeRule>,
}

impl FeeSchedule {
    /// Quarterly fee charged on `value` under this schedule.
    pub fn calculate_fee(&self, value: Decimal) -> Decimal {
        calculate_fee(&self.rules, value)
    }
}

/// One bracket of a fee schedule.
///
/// `rate` is annual (0.01 is 1%). `maximum` of `None` means unbounded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeeRule {
    pub id: String,
    pub schedule_id: String,
    pub minimum: Decimal,
    pub maximum: Option<Decimal>,
    pub rate: Decimal,
    pub flat: Decimal,
}

/// Input model for creating a new fee schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeeSchedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

impl NewFeeSchedule {
    pub fn validate(&self) -> Result<()> {
        validate_schedule_name(&self.name)
    }
}

/// Input model for renaming a fee schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeScheduleUpdate {
    pub id: Option<String>,
    pub name: String,
}

impl FeeScheduleUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.id.is_none() {
            return Err(invalid_input("Fee schedule ID is required for updates"));
        }
        validate_schedule_name(&self.name)
    }
}

/// Input model for adding a rule to a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeeRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub schedule_id: String,
    pub minimum: Decimal,
    pub maximum: Option<Decimal>,
    pub rate: Decimal,
    pub flat: Decimal,
}

impl NewFeeRule {
    /// Validates the bracket. Negative minimums are rejected here, never at
    /// evaluation time.
    pub fn validate(&self) -> Result<()> {
        if self.schedule_id.trim().is_empty() {
            return Err(invalid_input("Fee rule must belong to a schedule"));
        }
        validate_bracket(self.minimum, self.maximum, self.rate, self.flat)
    }
}

/// Input model for editing an existing rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRuleUpdate {
    pub id: Option<String>,
    pub minimum: Decimal,
    pub maximum: Option<Decimal>,
    pub rate: Decimal,
    pub flat: Decimal,
}

impl FeeRuleUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.id.is_none() {
            return Err(invalid_input("Fee rule ID is required for updates"));
        }
        validate_bracket(self.minimum, self.maximum, self.rate, self.flat)
    }
}

fn validate_schedule_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid_input("Fee schedule name cannot be empty"));
    }
    Ok(())
}

pub(crate) fn validate_bracket(
    minimum: Decimal,
    maximum: Option<Decimal>,
    rate: Decimal,
    flat: Decimal,
) -> Result<()> {
    if minimum < Decimal::ZERO {
        return Err(invalid_input("Invalid minimum: must not be negative"));
    }
    check_money(minimum, "minimum")?;
    if let Some(max) = maximum {
        if max < minimum {
            return Err(invalid_input(format!(
                "Invalid maximum: {} is below the minimum {}",
                max, minimum
            )));
        }
        check_money(max, "maximum")?;
    }
    if rate < Decimal::ZERO {
        return Err(invalid_input("Invalid rate: must not be negative"));
    }
    check_rate(rate)?;
    if flat < Decimal::ZERO {
        return Err(invalid_input("Invalid flat fee: must not be negative"));
    }
    check_money(flat, "flat fee")?;
    Ok(())
}
