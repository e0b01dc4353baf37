// Cycle calendar normalization
//
// Turns an uploaded spreadsheet into normalized calendar days:
// - Sheet selection: the "Cycle ... Calendar" sheet, else the first sheet
// - Header location: first row (of 20) naming Cycle, Cycle Date/Date and Type
// - Column mapping: header labels to positions, with the historical fixed layout as fallback
// - Row normalization: date/type coercion, cycle/zone derivation, dedup by date

pub mod column_map;
pub mod dates;
pub mod error;
pub mod header_locator;
pub mod model;
pub mod normalizer;
pub mod sheet_selector;
pub mod workbook;

pub use column_map::{CalendarField, ColumnMap, FieldColumns};
pub use error::NormalizeError;
pub use model::{DayType, NormalizedCalendar, NormalizedRecord, SkipReason, SkippedRow};
pub use normalizer::{RowOutcome, NormalizerState};
pub use workbook::{CellValue, Sheet, Workbook};

use std::path::Path;
use tracing::{debug, info};

/// Normalize raw spreadsheet bytes
pub fn normalize(bytes: &[u8]) -> Result<NormalizedCalendar, NormalizeError> {
    let sheet = workbook::load_calendar_sheet(bytes)?;
    normalize_sheet(&sheet)
}

/// Normalize a spreadsheet on disk (this is synchronous, caller should use spawn_blocking)
pub fn normalize_file(path: impl AsRef<Path>) -> Result<NormalizedCalendar, NormalizeError> {
    let sheet = workbook::load_calendar_sheet_from_path(path)?;
    normalize_sheet(&sheet)
}

/// Run the normalization stages over an already-decoded workbook
pub fn normalize_workbook(workbook: &Workbook) -> Result<NormalizedCalendar, NormalizeError> {
    let sheet = sheet_selector::select_sheet(workbook)?;
    normalize_sheet(sheet)
}

/// Normalize the rows of the calendar sheet
pub fn normalize_sheet(sheet: &Sheet) -> Result<NormalizedCalendar, NormalizeError> {
    info!("Normalizing cycle calendar sheet: {}", sheet.name);

    let header = header_locator::locate_header(&sheet.rows)?;
    let column_map = ColumnMap::from_labels(&header.labels);
    let columns = FieldColumns::from(&column_map);
    debug!("Header at row {} resolved columns {:?}", header.index, columns);

    normalizer::normalize_rows(&sheet.rows[header.index + 1..], &columns)
}
