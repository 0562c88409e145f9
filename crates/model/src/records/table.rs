use crate::records::sheet::Sheet;
use serde::{Deserialize, Serialize};

/// An ordered collection of sheets, the unit a run reads and writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    sheets: Vec<Sheet>,
}

impl Table {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Table { sheets }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name() == name)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name() == name)
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheets_mut(&mut self) -> &mut [Sheet] {
        &mut self.sheets
    }

    pub fn into_sheets(self) -> Vec<Sheet> {
        self.sheets
    }
}
