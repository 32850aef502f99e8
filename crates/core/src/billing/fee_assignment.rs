//! Pricing of individual snapshots.

use rust_decimal::Decimal;

use crate::constants::{FEE_DECIMAL_PRECISION, WEIGHT_DECIMAL_PRECISION};
use crate::errors::BillingError;
use crate::fee_schedules::FeeSchedule;

/// Fee for a single snapshot.
///
/// Zero when the snapshot is not billable or when no schedule is assigned.
/// A missing schedule is not an error: quarter totals are summed over these
/// values and an unassigned account simply contributes nothing.
pub fn assign_fee(billable: bool, schedule: Option<&FeeSchedule>, market_value: Decimal) -> Decimal {
    match schedule {
        Some(schedule) if billable => schedule.calculate_fee(market_value),
        _ => Decimal::ZERO,
    }
}

/// Share of the group market value held by one account, to four places.
pub fn group_weight(
    group_snapshot_id: &str,
    account_value: Decimal,
    group_value: Decimal,
) -> Result<Decimal, BillingError> {
    if group_value.is_zero() {
        return Err(BillingError::DivisionByZero {
            group_snapshot_id: group_snapshot_id.to_string(),
        });
    }
    Ok((account_value / group_value).round_dp(WEIGHT_DECIMAL_PRECISION))
}

/// An account's slice of its group's fee, to cents.
pub fn allocate_fee(group_fee: Decimal, weight: Decimal) -> Decimal {
    (group_fee * weight).round_dp(FEE_DECIMAL_PRECISION)
}
