//! CSV import/export of fee schedules.
//!
//! One line per rule: `Schedule Name,Minimum,Maximum,Rate,Flat`. An empty
//! maximum means the bracket is unbounded.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::fee_schedules_model::{validate_bracket, FeeSchedule};
use crate::errors::{BillingError, Result};
use crate::utils::csv_utils::{
    field, parse_decimal_field, parse_optional_decimal_field, read_records, write_rows,
};

pub const FEE_SCHEDULE_CSV_HEADER: [&str; 5] = ["Schedule Name", "Minimum", "Maximum", "Rate", "Flat"];

/// A parsed fee-schedule CSV line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeScheduleImportRow {
    pub line: usize,
    pub schedule_name: String,
    pub minimum: Decimal,
    pub maximum: Option<Decimal>,
    pub rate: Decimal,
    pub flat: Decimal,
}

/// Parses and validates every line. The first invalid line aborts the import.
pub fn parse_fee_schedule_csv(content: &str) -> Result<Vec<FeeScheduleImportRow>> {
    let mut rows = Vec::new();
    for (line, record) in read_records(content)? {
        let schedule_name = field(&record, 0, line, "schedule name")?.to_string();
        if schedule_name.is_empty() {
            return Err(BillingError::Import {
                line,
                message: "schedule name is empty".to_string(),
            }
            .into());
        }
        let row = FeeScheduleImportRow {
            line,
            schedule_name,
            minimum: parse_decimal_field(&record, 1, line, "minimum")?,
            maximum: parse_optional_decimal_field(&record, 2, line, "maximum")?,
            rate: parse_decimal_field(&record, 3, line, "rate")?,
            flat: parse_decimal_field(&record, 4, line, "flat")?,
        };
        validate_bracket(row.minimum, row.maximum, row.rate, row.flat).map_err(|e| {
            BillingError::Import {
                line,
                message: e.to_string(),
            }
        })?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn write_fee_schedule_csv(schedules: &[FeeSchedule]) -> Result<String> {
    let rows = schedules
        .iter()
        .flat_map(|schedule| {
            schedule.rules.iter().map(move |rule| {
                vec![
                    schedule.name.clone(),
                    rule.minimum.to_string(),
                    rule.maximum.map(|m| m.to_string()).unwrap_or_default(),
                    rule.rate.to_string(),
                    rule.flat.to_string(),
                ]
            })
        })
        .collect();
    write_rows(&FEE_SCHEDULE_CSV_HEADER, rows)
}
