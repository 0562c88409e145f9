use engine_config::settings::SheetLayout;
use model::{
    core::{identifiers::RowId, value::CellValue},
    execution::target::{Target, TargetSet},
    records::sheet::Sheet,
};
use tracing::{debug, info};

/// Finds the header row of a sheet and collects the URLs below it.
pub struct RowExtractor<'a> {
    layout: &'a SheetLayout,
}

impl<'a> RowExtractor<'a> {
    pub fn new(layout: &'a SheetLayout) -> Self {
        Self { layout }
    }

    /// First row within the scan window whose target cell contains one of
    /// the header markers. Falls back to the first row.
    pub fn find_header_row(&self, sheet: &Sheet) -> RowId {
        let window = sheet.row_count().min(self.layout.header_scan_rows);

        (1..=window)
            .map(RowId::new)
            .find(|row| self.is_header_cell(sheet.cell(*row, self.layout.target_column)))
            .unwrap_or_else(|| {
                debug!(sheet = sheet.name(), "No header marker found, using row 1");
                RowId::FIRST
            })
    }

    /// Stamps the header label, then collects every qualifying target below
    /// the header row.
    ///
    /// The stamp is written before any row is read, so it lands even when
    /// the sheet turns out to hold no targets.
    pub fn extract(&self, sheet: &mut Sheet) -> TargetSet {
        let header = self.find_header_row(sheet);
        sheet.set_cell(
            header,
            self.layout.output_column,
            CellValue::Text(self.layout.header_label.clone()),
        );

        let mut targets = TargetSet::new(sheet.name(), header);
        let Some(last) = sheet.last_populated_row() else {
            return targets;
        };

        let mut row = header.next();
        while row <= last {
            if let Some(target) = Target::from_cell(sheet.cell(row, self.layout.target_column)) {
                targets.push(target, row);
            }
            row = row.next();
        }

        info!(
            sheet = sheet.name(),
            header_row = header.ordinal(),
            targets = targets.len(),
            rows = targets.row_count(),
            "Extracted targets"
        );
        targets
    }

    fn is_header_cell(&self, cell: &CellValue) -> bool {
        let Some(text) = cell.as_text() else {
            return false;
        };
        let lowered = text.to_lowercase();
        self.layout
            .header_keywords
            .iter()
            .any(|keyword| lowered.contains(keyword.as_str()))
    }
}
