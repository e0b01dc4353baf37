use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of scheduled day, written in source sheets as a single letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayType {
    #[serde(rename = "R")]
    Route,
    #[serde(rename = "W")]
    Weekend,
    #[serde(rename = "H")]
    Holiday,
}

impl DayType {
    /// Parse a type cell (whitespace and case are ignored)
    pub fn from_code(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "R" => Some(DayType::Route),
            "W" => Some(DayType::Weekend),
            "H" => Some(DayType::Holiday),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            DayType::Route => "R",
            DayType::Weekend => "W",
            DayType::Holiday => "H",
        }
    }

    /// Route days are the ones plotted on collection maps
    pub fn is_plotted(self) -> bool {
        self == DayType::Route
    }
}

impl std::fmt::Display for DayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One normalized calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    pub cycle_number: u32,
    pub zone: u32,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub day_type: DayType,
    pub plot_flag: bool,
    pub version: i32,
}

/// Version stamped on freshly normalized records
pub const INITIAL_RECORD_VERSION: i32 = 1;

/// Why a data row did not produce a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingDate,
    UnparseableDate(String),
    UnrecognizedType(String),
    DuplicateDate(NaiveDate),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingDate => write!(f, "missing date"),
            SkipReason::UnparseableDate(s) => write!(f, "unparseable date '{s}'"),
            SkipReason::UnrecognizedType(s) => write!(f, "unrecognized type '{s}'"),
            SkipReason::DuplicateDate(d) => write!(f, "duplicate date {d}"),
        }
    }
}

/// A data row that was dropped, by position among the rows after the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: SkipReason,
}

/// Result of normalizing one calendar sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedCalendar {
    pub records: Vec<NormalizedRecord>,
    pub max_cycle: u32,
    pub inferred_year: i32,
    #[serde(skip)]
    pub skipped_rows: Vec<SkippedRow>,
}

impl NormalizedCalendar {
    pub fn row_count(&self) -> usize {
        self.records.len()
    }
}
