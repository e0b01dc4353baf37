use tracing::{debug, warn};

use crate::calendar::error::NormalizeError;
use crate::calendar::workbook::CellValue;

/// Number of leading rows searched for the header
pub const HEADER_SCAN_LIMIT: usize = 20;

/// The located header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRow {
    /// Index of the header within the sheet's rows
    pub index: usize,
    /// Trimmed labels in their original case
    pub labels: Vec<String>,
}

/// Find the first row (within [`HEADER_SCAN_LIMIT`]) naming the cycle, date and type columns
///
/// Each check is independent, so column order inside the row does not matter.
pub fn locate_header(rows: &[Vec<CellValue>]) -> Result<HeaderRow, NormalizeError> {
    for (index, row) in rows.iter().take(HEADER_SCAN_LIMIT).enumerate() {
        let cleaned: Vec<String> = row
            .iter()
            .map(|c| c.to_text().trim().to_lowercase())
            .collect();

        let has_cycle = cleaned.iter().any(|c| c == "cycle");
        let has_date = cleaned.iter().any(|c| c == "cycle date" || c == "date");
        let has_type = cleaned.iter().any(|c| c == "type");

        if has_cycle && has_date && has_type {
            let labels = row.iter().map(|c| c.to_text().trim().to_string()).collect();
            debug!("Found header row at index {}", index);
            return Ok(HeaderRow { index, labels });
        }
    }

    warn!(
        "No header row found in first {} of {} rows",
        HEADER_SCAN_LIMIT.min(rows.len()),
        rows.len()
    );
    Err(NormalizeError::HeaderNotFound)
}
