/// In-memory workbook model and spreadsheet loading
///
/// Uploaded calendars are decoded with calamine into plain rows of [`CellValue`] so every
/// later stage works on owned, immutable data without touching the reader. Only the
/// calendar sheet is decoded; the rest of the file is never read past its sheet names.
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use chrono::{NaiveDate, NaiveDateTime};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, info};

use crate::calendar::error::NormalizeError;
use crate::calendar::sheet_selector::select_sheet_index;

/// A single raw cell value, untyped beyond what the spreadsheet itself recorded
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl CellValue {
    /// Text rendering used for label matching and digit extraction
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    /// True for empty cells and text cells holding only whitespace
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value.and_time(chrono::NaiveTime::MIN))
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(excel_date) => {
                if excel_date.is_duration() {
                    return CellValue::Number(excel_date.as_f64());
                }
                excel_date
                    .as_datetime()
                    .map(CellValue::Date)
                    .unwrap_or_else(|| CellValue::Number(excel_date.as_f64()))
            }
            Data::DateTimeIso(s) => parse_iso_cell(s),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Text(e.to_string()),
        }
    }
}

/// Whole numbers render without a fractional part ("12", not "12.0")
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// ODS files report dates as ISO strings rather than serials
fn parse_iso_cell(s: &str) -> CellValue {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return CellValue::Date(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return CellValue::from(d);
    }
    CellValue::Text(s.to_string())
}

/// A named worksheet holding its non-blank rows
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Convert a calamine range into rows with absolute column positions
    ///
    /// calamine trims the range to the used area, so a sheet whose data begins in
    /// column C is padded back out with two empty cells per row. Rows where every
    /// cell is blank are dropped.
    pub fn from_range(name: impl Into<String>, range: &Range<Data>) -> Self {
        let column_offset = range.start().map(|(_, col)| col as usize).unwrap_or(0);

        let rows = range
            .rows()
            .filter(|row| !row.iter().all(|c| CellValue::from(c).is_blank()))
            .map(|row| {
                let mut cells = vec![CellValue::Empty; column_offset];
                cells.extend(row.iter().map(CellValue::from));
                cells
            })
            .collect();

        Self::new(name, rows)
    }
}

/// Ordered sequence of sheets, as they appear in the source file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }
}

/// Decode the calendar sheet from raw spreadsheet bytes (xlsx, xlsm, xlsb, xls or ods)
pub fn load_calendar_sheet(bytes: &[u8]) -> Result<Sheet, NormalizeError> {
    debug!("Opening workbook from {} bytes", bytes.len());
    let sheets = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| NormalizeError::WorkbookOpen(e.to_string()))?;
    read_calendar_sheet(sheets)
}

/// Decode the calendar sheet from a file on disk (this is synchronous, caller should use spawn_blocking)
pub fn load_calendar_sheet_from_path(path: impl AsRef<Path>) -> Result<Sheet, NormalizeError> {
    let path = path.as_ref();
    info!("Opening workbook: {}", path.display());
    let sheets =
        open_workbook_auto(path).map_err(|e| NormalizeError::WorkbookOpen(e.to_string()))?;
    read_calendar_sheet(sheets)
}

fn read_calendar_sheet<RS: Read + Seek>(mut sheets: Sheets<RS>) -> Result<Sheet, NormalizeError> {
    let names = sheets.sheet_names();
    let name = names[select_sheet_index(&names)?].clone();

    let range = sheets
        .worksheet_range(&name)
        .map_err(|e| NormalizeError::SheetRead {
            sheet: name.clone(),
            msg: e.to_string(),
        })?;

    let sheet = Sheet::from_range(name, &range);
    debug!("Loaded sheet '{}' with {} rows", sheet.name, sheet.rows.len());
    Ok(sheet)
}
