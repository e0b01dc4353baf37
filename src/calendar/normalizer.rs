/// Row normalization for cycle calendar sheets
///
/// Every data row is evaluated on its own into a [`RowOutcome`]. Outcomes are folded
/// into [`NormalizerState`], which carries the dates already emitted and the running
/// maximum cycle number.
use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::calendar::column_map::FieldColumns;
use crate::calendar::dates::{coerce_date, DateIssue};
use crate::calendar::error::NormalizeError;
use crate::calendar::model::{
    DayType, NormalizedCalendar, NormalizedRecord, SkipReason, SkippedRow,
    INITIAL_RECORD_VERSION,
};
use crate::calendar::workbook::CellValue;
use crate::utils::parse_digits;

/// Outcome of evaluating a single data row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Accepted(NormalizedRecord),
    Skipped(SkipReason),
}

/// Fold state threaded through the row loop
#[derive(Debug, Clone, Default)]
pub struct NormalizerState {
    seen_dates: HashSet<NaiveDate>,
    max_cycle: u32,
    records: Vec<NormalizedRecord>,
    skipped: Vec<SkippedRow>,
}

impl NormalizerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one row against the current state and fold the outcome in
    pub fn process_row(
        &mut self,
        row_number: usize,
        row: &[CellValue],
        columns: &FieldColumns,
    ) -> RowOutcome {
        let outcome = evaluate_row(row, columns, &self.seen_dates);
        self.apply(row_number, outcome.clone());
        outcome
    }

    fn apply(&mut self, row_number: usize, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Accepted(record) => {
                self.seen_dates.insert(record.date);
                self.max_cycle = self.max_cycle.max(record.cycle_number);
                self.records.push(record);
            }
            RowOutcome::Skipped(reason) => {
                debug!("Skipping data row {}: {}", row_number, reason);
                self.skipped.push(SkippedRow {
                    row: row_number,
                    reason,
                });
            }
        }
    }

    /// Close the run, rejecting it when no row survived
    pub fn finish(self) -> Result<NormalizedCalendar, NormalizeError> {
        let inferred_year = match self.records.first() {
            Some(first) => first.date.year(),
            None => {
                warn!(
                    "No valid data rows found ({} rows skipped)",
                    self.skipped.len()
                );
                return Err(NormalizeError::NoValidRows);
            }
        };

        info!(
            "Normalized {} calendar days ({} rows skipped), max cycle {}, year {}",
            self.records.len(),
            self.skipped.len(),
            self.max_cycle,
            inferred_year
        );

        Ok(NormalizedCalendar {
            records: self.records,
            max_cycle: self.max_cycle,
            inferred_year,
            skipped_rows: self.skipped,
        })
    }
}

/// Read a cell by position; positions past the end of a short row read as empty
fn cell_at(row: &[CellValue], index: usize) -> &CellValue {
    static EMPTY: CellValue = CellValue::Empty;
    row.get(index).unwrap_or(&EMPTY)
}

/// Evaluate a data row without touching any state
///
/// Checks run date, then type, then duplicate date; the first failure is the reported reason.
pub fn evaluate_row(
    row: &[CellValue],
    columns: &FieldColumns,
    seen_dates: &HashSet<NaiveDate>,
) -> RowOutcome {
    let date = match coerce_date(cell_at(row, columns.date)) {
        Ok(date) => date,
        Err(DateIssue::Missing) => return RowOutcome::Skipped(SkipReason::MissingDate),
        Err(DateIssue::Unparseable(text)) => {
            return RowOutcome::Skipped(SkipReason::UnparseableDate(text))
        }
    };

    let raw_type = cell_at(row, columns.day_type).to_text();
    let Some(day_type) = DayType::from_code(&raw_type) else {
        return RowOutcome::Skipped(SkipReason::UnrecognizedType(raw_type.trim().to_string()));
    };

    let mut cycle_number = parse_digits(&cell_at(row, columns.cycle).to_text());
    let mut zone = parse_digits(&cell_at(row, columns.zone).to_text());

    if cycle_number == 0 {
        cycle_number = date.month();
    }
    if zone == 0 {
        zone = date.day();
    }

    if seen_dates.contains(&date) {
        return RowOutcome::Skipped(SkipReason::DuplicateDate(date));
    }

    RowOutcome::Accepted(NormalizedRecord {
        cycle_number,
        zone,
        date,
        day_type,
        plot_flag: day_type.is_plotted(),
        version: INITIAL_RECORD_VERSION,
    })
}

/// Normalize every row after the header into a calendar
pub fn normalize_rows(
    rows: &[Vec<CellValue>],
    columns: &FieldColumns,
) -> Result<NormalizedCalendar, NormalizeError> {
    debug!("Normalizing {} data rows with columns {:?}", rows.len(), columns);

    let state = rows
        .iter()
        .enumerate()
        .fold(NormalizerState::new(), |mut state, (i, row)| {
            state.process_row(i, row, columns);
            state
        });

    state.finish()
}
