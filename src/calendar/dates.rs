/// Date coercion for calendar cells
///
/// Cells arrive as real dates, spreadsheet serial numbers or free text. All of them are
/// reduced to a UTC calendar day.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::calendar::workbook::CellValue;

/// Days between 1899-12-30 (serial 0) and the Unix epoch
const EXCEL_UNIX_EPOCH_OFFSET: f64 = 25569.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Date-only text layouts accepted in the date column
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    // Two-digit years first: %Y would happily read "24" as year 24
    "%m/%d/%y",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%a %b %d %Y",
    "%A, %B %d, %Y",
];

/// Date-time text layouts without an offset, read as UTC
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Why a date cell could not be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateIssue {
    Missing,
    Unparseable(String),
}

/// Coerce a raw date cell into a UTC calendar day
pub fn coerce_date(cell: &CellValue) -> Result<NaiveDate, DateIssue> {
    match cell {
        CellValue::Date(dt) => Ok(dt.date()),
        CellValue::Number(serial) => {
            excel_serial_to_date(*serial).ok_or_else(|| DateIssue::Unparseable(cell.to_text()))
        }
        CellValue::Text(s) if !s.trim().is_empty() => {
            parse_date_text(s).ok_or_else(|| DateIssue::Unparseable(s.trim().to_string()))
        }
        CellValue::Bool(b) => Err(DateIssue::Unparseable(b.to_string())),
        CellValue::Text(_) | CellValue::Empty => Err(DateIssue::Missing),
    }
}

/// Convert a spreadsheet serial (1900 date system) to its UTC calendar day
///
/// The serial is scaled to milliseconds since the Unix epoch and rounded, so a
/// fractional part only moves the day once it crosses midnight.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let millis = ((serial - EXCEL_UNIX_EPOCH_OFFSET) * MILLIS_PER_DAY).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(millis as i64).map(|dt| dt.date_naive())
}

/// Parse a free-text date, taking the UTC day for values with an offset
pub fn parse_date_text(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(trimmed, f).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(trimmed, f).ok())
        })
}
