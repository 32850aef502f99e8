//! Helpers shared by the SQLite repositories.
//!
//! Decimals are stored as TEXT so that no precision is lost to SQLite's
//! REAL affinity.

use std::str::FromStr;

use log::warn;
use rust_decimal::Decimal;
use wealthdesk_core::constants::DECIMAL_PRECISION;

/// SQLite's historical bound on bind parameters per statement.
pub const SQLITE_MAX_PARAMS: usize = 999;

/// Splits `items` into batches that fit in one multi-row INSERT of
/// `columns` columns.
pub fn chunk_for_insert<T>(items: &[T], columns: usize) -> impl Iterator<Item = &[T]> {
    let rows_per_chunk = (SQLITE_MAX_PARAMS / columns.max(1)).max(1);
    items.chunks(rows_per_chunk)
}

pub fn decimal_to_text(value: Decimal) -> String {
    value.round_dp(DECIMAL_PRECISION).to_string()
}

/// Unparseable values are logged and read as zero.
pub fn text_to_decimal(text: &str) -> Decimal {
    Decimal::from_str(text).unwrap_or_else(|e| {
        warn!("Invalid decimal '{}' in database: {}", text, e);
        Decimal::ZERO
    })
}
