use crate::error::CliError;
use engine_config::report::summary::SummaryReport;
use model::execution::summary::RunSummary;
use std::path::Path;

pub async fn write_report(report: &SummaryReport, path: &Path) -> Result<(), CliError> {
    let report_json = report.to_json()?;
    tokio::fs::write(path, report_json).await?;
    Ok(())
}

pub fn print_report(report: &SummaryReport) -> Result<(), CliError> {
    let report_json = report.to_json()?;
    println!("{report_json}");
    Ok(())
}

pub fn print_summary(summary: &RunSummary) {
    println!(
        "{:<24} {:<16} {:>9} {:>7}",
        "Sheet", "Status", "Indexed", "Rows"
    );
    println!("{}", "-".repeat(59));
    for outcome in summary.outcomes() {
        println!(
            "{:<24} {:<16} {:>9} {:>7}",
            outcome.sheet,
            outcome.status,
            format!("{}/{}", outcome.positive, outcome.total),
            outcome.rows_written
        );
    }
    println!("{}", "-".repeat(59));
    println!(
        "{:<24} {:<16} {:>9}",
        "Total",
        "",
        format!("{}/{}", summary.total_positive(), summary.total_submitted())
    );
}
