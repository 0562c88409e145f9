use crate::error::ReconcileError;
use model::{
    core::{identifiers::Column, value::CellValue},
    execution::{job::CompletionReport, target::TargetSet},
    records::sheet::Sheet,
};
use tracing::{debug, info};

/// What a reconciliation wrote back into its sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Distinct targets found in the report.
    pub positive_targets: usize,
    /// Rows that received a boolean, duplicates included.
    pub rows_written: usize,
    /// Report entries that match no submitted target.
    pub unmatched: usize,
}

/// Writes the verdict of `report` into `output_column` for every row that
/// referenced a submitted target.
///
/// Matching is exact string equality. Rows that never qualified as targets
/// are left untouched, so "not checked" stays distinguishable from "checked,
/// negative".
pub fn reconcile(
    sheet: &mut Sheet,
    output_column: Column,
    targets: &TargetSet,
    report: &CompletionReport,
) -> Result<Reconciliation, ReconcileError> {
    if sheet.name() != targets.sheet() {
        return Err(ReconcileError::SheetMismatch {
            expected: targets.sheet().to_string(),
            actual: sheet.name().to_string(),
        });
    }

    let mut outcome = Reconciliation::default();
    for (target, rows) in targets.iter() {
        let positive = report.is_positive(target);
        if positive {
            outcome.positive_targets += 1;
        }
        for row in rows {
            sheet.set_cell(*row, output_column, CellValue::Bool(positive));
            outcome.rows_written += 1;
        }
    }

    outcome.unmatched = report
        .positives()
        .filter(|link| !targets.contains(link))
        .inspect(|link| debug!(sheet = sheet.name(), link, "Report entry matches no target"))
        .count();

    info!(
        sheet = sheet.name(),
        positive = outcome.positive_targets,
        total = targets.len(),
        rows_written = outcome.rows_written,
        "Reconciled report"
    );
    Ok(outcome)
}
