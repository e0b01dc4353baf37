use tracing::debug;

use crate::calendar::error::NormalizeError;
use crate::calendar::workbook::{Sheet, Workbook};

/// Index of the sheet holding the cycle calendar
///
/// The first sheet whose name contains both "Cycle" and "Calendar" wins (case-sensitive).
/// Workbooks without such a sheet fall back to their first sheet.
pub fn select_sheet_index<S: AsRef<str>>(names: &[S]) -> Result<usize, NormalizeError> {
    if names.is_empty() {
        return Err(NormalizeError::EmptyWorkbook);
    }

    let index = names
        .iter()
        .position(|n| n.as_ref().contains("Cycle") && n.as_ref().contains("Calendar"))
        .unwrap_or(0);

    debug!(
        "Selected sheet '{}' out of {} sheets",
        names[index].as_ref(),
        names.len()
    );
    Ok(index)
}

/// Pick the sheet holding the cycle calendar from an already-decoded workbook
pub fn select_sheet(workbook: &Workbook) -> Result<&Sheet, NormalizeError> {
    let names: Vec<&str> = workbook.sheets.iter().map(|s| s.name.as_str()).collect();
    let index = select_sheet_index(&names)?;
    Ok(&workbook.sheets[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(names: &[&str]) -> Workbook {
        Workbook::new(names.iter().map(|n| Sheet::new(*n, vec![])).collect())
    }

    #[test]
    fn test_empty_workbook() {
        let workbook = Workbook::default();
        let result = select_sheet(&workbook);
        assert!(matches!(result, Err(NormalizeError::EmptyWorkbook)));
    }

    #[test]
    fn test_prefers_cycle_calendar_sheet() {
        let workbook = named(&["Notes", "2024 Cycle Calendar", "Cycle Calendar (old)"]);
        assert_eq!(select_sheet(&workbook).unwrap().name, "2024 Cycle Calendar");
    }

    #[test]
    fn test_labels_can_appear_in_any_order() {
        let workbook = named(&["Summary", "Calendar_Cycle"]);
        assert_eq!(select_sheet(&workbook).unwrap().name, "Calendar_Cycle");
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let workbook = named(&["Summary", "cycle calendar"]);
        assert_eq!(select_sheet(&workbook).unwrap().name, "Summary");
    }

    #[test]
    fn test_index_from_names_alone() {
        assert_eq!(select_sheet_index(&["Notes", "Cycle Calendar"]).unwrap(), 1);
        assert_eq!(select_sheet_index(&["Notes", "Summary"]).unwrap(), 0);
        assert!(matches!(
            select_sheet_index::<&str>(&[]),
            Err(NormalizeError::EmptyWorkbook)
        ));
    }

    #[test]
    fn test_falls_back_to_first_sheet() {
        let workbook = named(&["Sheet1", "Sheet2"]);
        assert_eq!(select_sheet(&workbook).unwrap().name, "Sheet1");
    }
}
