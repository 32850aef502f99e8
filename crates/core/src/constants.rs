use rust_decimal::Decimal;

/// Fee schedule rates are annual; billing runs quarterly.
pub const QUARTERS_PER_YEAR: u32 = 4;

/// Decimal places kept on fees.
pub const FEE_DECIMAL_PRECISION: u32 = 2;

/// Decimal places kept on an account's share of its group.
pub const WEIGHT_DECIMAL_PRECISION: u32 = 4;

/// Decimal places used when persisting market values and totals.
pub const DECIMAL_PRECISION: u32 = 6;

/// Largest market value, bracket bound or flat fee accepted as input.
///
/// Keeps every sum and product the roll-up performs far inside `Decimal`'s range.
pub const MAX_MONEY_VALUE: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Largest annual rate a fee rule may carry (100%).
pub const MAX_ANNUAL_RATE: Decimal = Decimal::ONE;
