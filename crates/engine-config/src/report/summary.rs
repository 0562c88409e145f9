use engine_core::metrics::MetricsSnapshot;
use model::execution::summary::{RunSummary, SheetOutcome, SheetStatus};
use serde::Serialize;
use std::fmt::Write;

pub const REPORT_HEADER: &str = "🤖 *SpeedyIndex Check Report*";

/// Machine-readable record of a finished run.
#[derive(Serialize, Debug, Clone)]
pub struct SummaryReport {
    pub total_positive: usize,
    pub total_submitted: usize,
    /// Targets of the sheets whose job completed.
    pub total_checked: usize,
    pub failures: usize,
    pub summary: RunSummary,
    pub metrics: MetricsSnapshot,
}

impl SummaryReport {
    pub fn new(summary: RunSummary, metrics: MetricsSnapshot) -> Self {
        SummaryReport {
            total_positive: summary.total_positive(),
            total_submitted: summary.total_submitted(),
            total_checked: summary.total_checked(),
            failures: summary.failures(),
            summary,
            metrics,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Renders the chat message sent once a run finishes.
pub fn render_notification(summary: &RunSummary) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "{REPORT_HEADER}");
    let _ = writeln!(text, "Total Links: {}", summary.total_checked());
    text.push('\n');

    for outcome in summary.outcomes() {
        let _ = writeln!(text, "{}", status_line(outcome));
    }

    text.trim_end().to_string()
}

pub fn status_line(outcome: &SheetOutcome) -> String {
    let result = match outcome.status {
        SheetStatus::Success => format!("{}/{} indexed", outcome.positive, outcome.total),
        SheetStatus::NoTargets => "no links found".to_string(),
        SheetStatus::ApiError => "API Error".to_string(),
        SheetStatus::TransportError => "Transport Error".to_string(),
        SheetStatus::TimedOut => "Timeout".to_string(),
        SheetStatus::PollError => "Poll Error".to_string(),
        SheetStatus::Cancelled => "Cancelled".to_string(),
        SheetStatus::Failed => "Script Exception".to_string(),
    };
    format!("• List *{}*: {}", outcome.sheet, result)
}
