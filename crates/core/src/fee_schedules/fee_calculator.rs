//! Bracket fee evaluation.
//!
//! Brackets are additive: every rule contributes its flat fee, and every
//! rule whose minimum lies below the value contributes a marginal charge on
//! the slice of the value inside `(minimum, maximum]`. Rule order never
//! changes the result.
//!
//! Inputs are range-checked when rules and values are accepted. The
//! arithmetic here saturates so that unchecked input can never panic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::fee_schedules_model::FeeRule;
use crate::constants::{FEE_DECIMAL_PRECISION, QUARTERS_PER_YEAR};

/// Contribution of a single rule to a fee, before rounding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleCharge {
    pub rule_id: String,
    /// Slice of the value billed by this rule.
    pub billed_amount: Decimal,
    pub marginal_fee: Decimal,
    pub flat_fee: Decimal,
}

/// Quarterly fee for `value` under `rules`, rounded to cents.
///
/// The flat component of every rule is charged whether or not `value`
/// reaches its bracket.
pub fn calculate_fee(rules: &[FeeRule], value: Decimal) -> Decimal {
    rules
        .iter()
        .map(|rule| {
            let charge = rule_charge(rule, value);
            charge.flat_fee.saturating_add(charge.marginal_fee)
        })
        .fold(Decimal::ZERO, Decimal::saturating_add)
        .round_dp(FEE_DECIMAL_PRECISION)
}

/// Per-rule breakdown of [`calculate_fee`], in rule order.
pub fn fee_breakdown(rules: &[FeeRule], value: Decimal) -> Vec<RuleCharge> {
    rules.iter().map(|rule| rule_charge(rule, value)).collect()
}

fn rule_charge(rule: &FeeRule, value: Decimal) -> RuleCharge {
    // Strict: a value sitting exactly on the minimum bills nothing here.
    let billed_amount = if value > rule.minimum {
        let upper = match rule.maximum {
            Some(max) => value.min(max),
            None => value,
        };
        upper.saturating_sub(rule.minimum)
    } else {
        Decimal::ZERO
    };

    let quarterly_rate = rule.rate / Decimal::from(QUARTERS_PER_YEAR);

    RuleCharge {
        rule_id: rule.id.clone(),
        billed_amount,
        marginal_fee: billed_amount.saturating_mul(quarterly_rate),
        flat_fee: rule.flat,
    }
}
