use thiserror::Error;

/// Terminal rejections of a normalization run
///
/// Row-level problems never show up here; they are recorded as skipped rows.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Failed to read sheet {sheet}: {msg}")]
    SheetRead { sheet: String, msg: String },

    #[error("Workbook contains no sheets")]
    EmptyWorkbook,

    #[error("Invalid format: Could not find headers (Cycle, Cycle Date, Type).")]
    HeaderNotFound,

    #[error("No valid data rows found")]
    NoValidRows,
}
