use crate::core::identifiers::JobId;
use serde::Serialize;
use std::fmt;

/// Terminal outcome of one sheet's pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetStatus {
    Success,
    NoTargets,
    /// The service rejected the submission with a non-zero payload code.
    ApiError,
    /// Network-level failure while submitting.
    TransportError,
    TimedOut,
    PollError,
    Cancelled,
    /// Any other sheet-local failure.
    Failed,
}

impl SheetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetStatus::Success => "success",
            SheetStatus::NoTargets => "no-targets",
            SheetStatus::ApiError => "api-error",
            SheetStatus::TransportError => "transport-error",
            SheetStatus::TimedOut => "timeout",
            SheetStatus::PollError => "poll-error",
            SheetStatus::Cancelled => "cancelled",
            SheetStatus::Failed => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, SheetStatus::Success | SheetStatus::NoTargets)
    }
}

impl fmt::Display for SheetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetOutcome {
    pub sheet: String,
    pub status: SheetStatus,
    /// Distinct submitted targets confirmed positive.
    pub positive: usize,
    /// Distinct targets submitted.
    pub total: usize,
    pub rows_written: usize,
    pub job_id: Option<JobId>,
    pub detail: Option<String>,
}

impl SheetOutcome {
    pub fn new(sheet: impl Into<String>, status: SheetStatus) -> Self {
        SheetOutcome {
            sheet: sheet.into(),
            status,
            positive: 0,
            total: 0,
            rows_written: 0,
            job_id: None,
            detail: None,
        }
    }

    pub fn no_targets(sheet: impl Into<String>) -> Self {
        Self::new(sheet, SheetStatus::NoTargets)
    }

    pub fn with_counts(mut self, positive: usize, total: usize) -> Self {
        self.positive = positive;
        self.total = total;
        self
    }

    pub fn with_rows_written(mut self, rows: usize) -> Self {
        self.rows_written = rows;
        self
    }

    pub fn with_job(mut self, job_id: JobId) -> Self {
        self.job_id = Some(job_id);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Per-sheet outcomes of a finished run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    outcomes: Vec<SheetOutcome>,
}

impl RunSummary {
    pub fn new(outcomes: Vec<SheetOutcome>) -> Self {
        RunSummary { outcomes }
    }

    pub fn outcomes(&self) -> &[SheetOutcome] {
        &self.outcomes
    }

    pub fn outcome(&self, sheet: &str) -> Option<&SheetOutcome> {
        self.outcomes.iter().find(|o| o.sheet == sheet)
    }

    pub fn total_positive(&self) -> usize {
        self.outcomes.iter().map(|o| o.positive).sum()
    }

    pub fn total_submitted(&self) -> usize {
        self.outcomes.iter().map(|o| o.total).sum()
    }

    /// Targets of the sheets whose job completed and was reconciled.
    pub fn total_checked(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == SheetStatus::Success)
            .map(|o| o.total)
            .sum()
    }

    pub fn count(&self, status: SheetStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_failure()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_and_counts() {
        let summary = RunSummary::new(vec![
            SheetOutcome::new("a", SheetStatus::Success).with_counts(2, 5),
            SheetOutcome::new("b", SheetStatus::TimedOut).with_counts(0, 4),
            SheetOutcome::no_targets("c"),
            SheetOutcome::new("d", SheetStatus::Success).with_counts(1, 1),
        ]);

        assert_eq!(summary.total_positive(), 3);
        assert_eq!(summary.total_submitted(), 10);
        assert_eq!(summary.total_checked(), 6);
        assert_eq!(summary.count(SheetStatus::Success), 2);
        assert_eq!(summary.failures(), 1);
        assert_eq!(summary.outcome("b").unwrap().status, SheetStatus::TimedOut);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&SheetStatus::NoTargets).unwrap();
        assert_eq!(json, r#""no_targets""#);
    }
}
