//! Shared helpers for the CSV files exchanged with custodians and exports.
//!
//! Exports go through `csv::Writer` with `QuoteStyle::Necessary`. For the
//! usual data this is byte-identical to a plain comma join; a field holding a
//! comma or quote gets quoted instead of shifting the columns after it.

use std::str::FromStr;

use chrono::NaiveDate;
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Trim, WriterBuilder};
use rust_decimal::Decimal;

use crate::errors::{BillingError, Error, Result};

/// Parses a CSV document whose first line is a header, returning each data
/// record with its 1-based line number.
pub fn read_records(content: &str) -> Result<Vec<(usize, StringRecord)>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(records.len() + 2);
        records.push((line, record));
    }
    Ok(records)
}

/// Writes `header` followed by `rows` as CSV text.
pub fn write_rows(header: &[&str], rows: Vec<Vec<String>>) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Unexpected(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::Unexpected(e.to_string()))
}

pub fn field<'a>(record: &'a StringRecord, index: usize, line: usize, name: &str) -> Result<&'a str> {
    record.get(index).ok_or_else(|| {
        BillingError::Import {
            line,
            message: format!("missing column '{}' (index {})", name, index),
        }
        .into()
    })
}

pub fn parse_decimal_field(record: &StringRecord, index: usize, line: usize, name: &str) -> Result<Decimal> {
    let raw = field(record, index, line, name)?;
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| {
            BillingError::Import {
                line,
                message: format!("'{}' is not a valid {}", raw, name),
            }
            .into()
        })
}

/// Empty cells parse to `None`.
pub fn parse_optional_decimal_field(
    record: &StringRecord,
    index: usize,
    line: usize,
    name: &str,
) -> Result<Option<Decimal>> {
    match record.get(index) {
        None => Ok(None),
        Some(raw) if raw.is_empty() || raw.eq_ignore_ascii_case("none") => Ok(None),
        Some(_) => parse_decimal_field(record, index, line, name).map(Some),
    }
}

pub fn parse_date_field(record: &StringRecord, index: usize, line: usize, name: &str) -> Result<NaiveDate> {
    let raw = field(record, index, line, name)?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        BillingError::Import {
            line,
            message: format!("'{}' is not an ISO date for {}", raw, name),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_read_records_skips_header_and_blank_lines() {
        let content = "a,b\n1,2\n\n3,4\n";
        let records = read_records(content).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, 2);
        assert_eq!(&records[1].1[0], "3");
    }

    #[test]
    fn test_write_rows_plain_fields_are_not_quoted() {
        let out = write_rows(&["Group", "Fee"], vec![vec!["Smith".into(), "12.50".into()]]).unwrap();
        assert_eq!(out, "Group,Fee\nSmith,12.50\n");
    }

    #[test]
    fn test_write_rows_quotes_embedded_commas() {
        let out = write_rows(&["Group"], vec![vec!["Smith, John".into()]]).unwrap();
        assert_eq!(out, "Group\n\"Smith, John\"\n");
    }

    #[test]
    fn test_parse_decimal_field_reports_line() {
        let records = read_records("v\nabc\n").unwrap();
        let (line, record) = &records[0];
        let err = parse_decimal_field(record, 0, *line, "market value").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_optional_decimal_field() {
        let records = read_records("a,b\n,12.5\n").unwrap();
        let (line, record) = &records[0];
        assert_eq!(parse_optional_decimal_field(record, 0, *line, "a").unwrap(), None);
        assert_eq!(
            parse_optional_decimal_field(record, 1, *line, "b").unwrap(),
            Some(dec!(12.5))
        );
        assert_eq!(parse_optional_decimal_field(record, 5, *line, "c").unwrap(), None);
    }
}
