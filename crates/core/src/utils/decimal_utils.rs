//! Range checks and normalisation for amounts entering the billing engine.

use rust_decimal::Decimal;

use crate::constants::{DECIMAL_PRECISION, MAX_ANNUAL_RATE, MAX_MONEY_VALUE};
use crate::errors::{invalid_input, Result};

/// Rejects amounts whose magnitude exceeds [`MAX_MONEY_VALUE`].
pub fn check_money(value: Decimal, name: &str) -> Result<()> {
    if value.abs() > MAX_MONEY_VALUE {
        return Err(invalid_input(format!(
            "Invalid {}: {} exceeds the limit of {}",
            name, value, MAX_MONEY_VALUE
        )));
    }
    Ok(())
}

pub fn check_rate(rate: Decimal) -> Result<()> {
    if rate > MAX_ANNUAL_RATE {
        return Err(invalid_input(format!(
            "Invalid rate: {} exceeds the limit of {}",
            rate, MAX_ANNUAL_RATE
        )));
    }
    Ok(())
}

/// Range-checks a market value and rounds it to the stored precision.
///
/// Every market value is normalised once, on the way in, so cached totals
/// are summed from exactly the numbers that get persisted.
pub fn normalize_market_value(value: Decimal) -> Result<Decimal> {
    check_money(value, "market value")?;
    Ok(value.round_dp(DECIMAL_PRECISION))
}
