use crate::core::{identifiers::RowId, value::CellValue};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

/// A normalized URL submitted for checking.
///
/// Normalization is a trim only; case and trailing slashes are preserved
/// so that the value matches what the remote service echoes back.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Target(String);

impl Target {
    /// Returns the target a cell refers to, if the cell qualifies.
    ///
    /// Only text cells whose trimmed, lowercased form starts with `http://`
    /// or `https://` qualify; anything else is skipped silently.
    pub fn from_cell(cell: &CellValue) -> Option<Target> {
        cell.as_text().and_then(Target::parse)
    }

    pub fn parse(raw: &str) -> Option<Target> {
        let trimmed = raw.trim();
        let lowered = trimmed.to_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            Some(Target(trimmed.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Distinct targets of one sheet together with every row referencing each.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSet {
    sheet: String,
    header_row: RowId,
    order: Vec<Target>,
    rows: HashMap<Target, Vec<RowId>>,
}

impl TargetSet {
    pub fn new(sheet: impl Into<String>, header_row: RowId) -> Self {
        TargetSet {
            sheet: sheet.into(),
            header_row,
            order: Vec::new(),
            rows: HashMap::new(),
        }
    }

    /// Records that `row` references `target`. Rows must be pushed in
    /// ascending order; a target seen before keeps its first position.
    pub fn push(&mut self, target: Target, row: RowId) {
        match self.rows.get_mut(&target) {
            Some(rows) => rows.push(row),
            None => {
                self.order.push(target.clone());
                self.rows.insert(target, vec![row]);
            }
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn header_row(&self) -> RowId {
        self.header_row
    }

    /// Distinct targets in first-seen row order.
    pub fn targets(&self) -> &[Target] {
        &self.order
    }

    pub fn rows_for(&self, target: &Target) -> &[RowId] {
        self.rows.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, target: &str) -> bool {
        self.rows.contains_key(&Target(target.to_string()))
    }

    /// Iterates `(target, rows)` pairs in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (&Target, &[RowId])> {
        self.order.iter().map(|t| (t, self.rows_for(t)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of rows referencing any target, duplicates included.
    pub fn row_count(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    pub fn urls(&self) -> Vec<String> {
        self.order.iter().map(|t| t.0.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qualifying_values() {
        assert_eq!(
            Target::parse("  https://a.test/x  ").unwrap().as_str(),
            "https://a.test/x"
        );
        assert_eq!(
            Target::parse("HTTP://Upper.test/").unwrap().as_str(),
            "HTTP://Upper.test/"
        );
        assert!(Target::parse("not-a-url").is_none());
        assert!(Target::parse("ftp://a.test").is_none());
        assert!(Target::parse("").is_none());
    }

    #[test]
    fn test_only_text_cells_qualify() {
        assert!(Target::from_cell(&CellValue::Number(1.0)).is_none());
        assert!(Target::from_cell(&CellValue::Error("#N/A".into())).is_none());
        assert!(Target::from_cell(&CellValue::Empty).is_none());
        assert!(Target::from_cell(&CellValue::from("https://a.test")).is_some());
    }

    #[test]
    fn test_push_deduplicates_and_keeps_provenance() {
        let mut set = TargetSet::new("Backlinks", RowId::new(3));
        let a = Target::parse("https://a.test").unwrap();
        let b = Target::parse("https://b.test").unwrap();
        set.push(a.clone(), RowId::new(4));
        set.push(b.clone(), RowId::new(5));
        set.push(a.clone(), RowId::new(6));

        assert_eq!(set.len(), 2);
        assert_eq!(set.row_count(), 3);
        assert_eq!(set.targets(), &[a.clone(), b.clone()]);
        assert_eq!(set.rows_for(&a), &[RowId::new(4), RowId::new(6)]);
        assert_eq!(set.rows_for(&b), &[RowId::new(5)]);
        assert_eq!(set.urls(), vec!["https://a.test", "https://b.test"]);
        assert!(set.contains("https://a.test"));
        assert!(!set.contains("https://a.test/"));
    }
}
