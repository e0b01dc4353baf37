use std::collections::HashMap;

/// Only the first few columns carry calendar fields
pub const MAX_MAPPED_COLUMNS: usize = 7;

/// Logical calendar fields read from each data row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarField {
    Cycle,
    Zone,
    Date,
    Type,
}

impl CalendarField {
    /// Accepted header labels, in priority order
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            CalendarField::Cycle => &["cycle", "cycle #"],
            CalendarField::Zone => &["zone"],
            CalendarField::Date => &["cycle date", "date"],
            CalendarField::Type => &["type"],
        }
    }

    /// Position used by the historical fixed layout when no label matches
    pub fn fallback_index(self) -> usize {
        match self {
            CalendarField::Cycle => 0,
            CalendarField::Zone => 1,
            CalendarField::Date => 3,
            CalendarField::Type => 4,
        }
    }
}

/// Cleaned header label to column index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    positions: HashMap<String, usize>,
}

impl ColumnMap {
    /// Build from header labels; the first column carrying a label wins
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut positions = HashMap::new();

        for (i, label) in labels.iter().enumerate().take(MAX_MAPPED_COLUMNS) {
            let cleaned = label.as_ref().trim().to_lowercase();
            if cleaned.is_empty() {
                continue;
            }
            positions.entry(cleaned).or_insert(i);
        }

        Self { positions }
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.positions.get(label).copied()
    }

    /// Position of the first synonym present in the header, else `fallback_index`
    pub fn resolve_column(&self, accepted_names: &[&str], fallback_index: usize) -> usize {
        accepted_names
            .iter()
            .find_map(|name| self.get(&name.trim().to_lowercase()))
            .unwrap_or(fallback_index)
    }

    pub fn resolve(&self, field: CalendarField) -> usize {
        self.resolve_column(field.synonyms(), field.fallback_index())
    }
}

/// Resolved column index for each calendar field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldColumns {
    pub cycle: usize,
    pub zone: usize,
    pub date: usize,
    pub day_type: usize,
}

impl From<&ColumnMap> for FieldColumns {
    fn from(map: &ColumnMap) -> Self {
        Self {
            cycle: map.resolve(CalendarField::Cycle),
            zone: map.resolve(CalendarField::Zone),
            date: map.resolve(CalendarField::Date),
            day_type: map.resolve(CalendarField::Type),
        }
    }
}
