use crate::core::{
    identifiers::{Column, RowId},
    value::CellValue,
};
use serde::{Deserialize, Serialize};

static EMPTY_CELL: CellValue = CellValue::Empty;

/// One named dataset of a table, stored row-major.
///
/// Rows may be ragged; cells beyond a row's end read as [`CellValue::Empty`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Sheet {
            name: name.into(),
            rows,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// The last row holding at least one non-empty cell.
    pub fn last_populated_row(&self) -> Option<RowId> {
        self.rows
            .iter()
            .rposition(|row| row.iter().any(|cell| !cell.is_empty()))
            .map(RowId::from_index)
    }

    pub fn cell(&self, row: RowId, column: Column) -> &CellValue {
        self.rows
            .get(row.index())
            .and_then(|cells| cells.get(column.index()))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Writes a cell, growing the sheet as needed so the position exists.
    pub fn set_cell(&mut self, row: RowId, column: Column, value: CellValue) {
        if self.rows.len() <= row.index() {
            self.rows.resize_with(row.index() + 1, Vec::new);
        }
        let cells = &mut self.rows[row.index()];
        if cells.len() <= column.index() {
            cells.resize(column.index() + 1, CellValue::Empty);
        }
        cells[column.index()] = value;
    }
}
