use crate::{
    error::{RunError, SheetError},
    execution::{poller::JobPoller, submitter::JobSubmitter},
};
use connectors::check::CheckService;
use engine_config::settings::{RunMode, SheetLayout, validated::ValidatedSettings};
use engine_core::metrics::{Metrics, MetricsSnapshot};
use engine_processing::{extractor::RowExtractor, reconciler::reconcile};
use model::{
    execution::{
        job::{Job, JobState},
        summary::{RunSummary, SheetOutcome, SheetStatus},
        target::TargetSet,
    },
    records::{sheet::Sheet, table::Table},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Everything a finished run hands back to its caller.
#[derive(Debug)]
pub struct RunOutput {
    /// The annotated table; unselected sheets are passed through untouched.
    pub table: Table,
    pub summary: RunSummary,
    pub metrics: MetricsSnapshot,
}

/// Runs the extract, submit, poll and reconcile pipeline over the selected
/// sheets of `table`. An empty selection means every sheet.
pub async fn run(
    table: Table,
    selection: &[String],
    service: Arc<dyn CheckService>,
    settings: &ValidatedSettings,
    cancel: CancellationToken,
) -> Result<RunOutput, RunError> {
    RunCoordinator::new(service, settings, cancel)
        .execute(table, selection)
        .await
}

struct RunCoordinator<'a> {
    settings: &'a ValidatedSettings,
    layout: SheetLayout,
    submitter: JobSubmitter,
    poller: JobPoller,
    metrics: Metrics,
    cancel: CancellationToken,
}

/// A sheet whose job was accepted and now waits for its verdict.
struct Pending {
    slot: usize,
    targets: TargetSet,
}

impl<'a> RunCoordinator<'a> {
    fn new(
        service: Arc<dyn CheckService>,
        settings: &'a ValidatedSettings,
        cancel: CancellationToken,
    ) -> Self {
        let metrics = Metrics::new();
        Self {
            settings,
            layout: settings.layout(),
            submitter: JobSubmitter::new(service.clone(), metrics.clone()),
            poller: JobPoller::new(service, settings.poll_policy(), metrics.clone()),
            metrics,
            cancel,
        }
    }

    async fn execute(self, mut table: Table, selection: &[String]) -> Result<RunOutput, RunError> {
        let selected = Self::resolve_selection(&table, selection)?;
        info!(
            sheets = selected.len(),
            mode = %self.settings.mode(),
            "Starting indexation check"
        );

        let outcomes = match self.settings.mode() {
            RunMode::Sequential => self.run_sequential(&mut table, &selected).await,
            RunMode::Batched => self.run_batched(&mut table, &selected).await,
        };

        let summary = RunSummary::new(outcomes);
        info!(
            positive = summary.total_positive(),
            submitted = summary.total_submitted(),
            failures = summary.failures(),
            "Indexation check finished"
        );

        Ok(RunOutput {
            table,
            summary,
            metrics: self.metrics.snapshot(),
        })
    }

    fn resolve_selection(table: &Table, selection: &[String]) -> Result<Vec<String>, RunError> {
        if table.is_empty() {
            return Err(RunError::EmptyWorkbook);
        }
        if selection.is_empty() {
            return Ok(table.sheet_names().into_iter().map(String::from).collect());
        }

        let mut selected: Vec<String> = Vec::with_capacity(selection.len());
        for name in selection {
            if table.position(name).is_none() {
                return Err(RunError::UnknownSheet(name.clone()));
            }
            if !selected.contains(name) {
                selected.push(name.clone());
            }
        }
        Ok(selected)
    }

    /// One sheet at a time: its job is polled to the end before the next
    /// sheet is submitted.
    async fn run_sequential(&self, table: &mut Table, selected: &[String]) -> Vec<SheetOutcome> {
        let mut outcomes = Vec::with_capacity(selected.len());

        for (idx, name) in selected.iter().enumerate() {
            info!("Processing sheet {}/{}: {}", idx + 1, selected.len(), name);
            let Some(sheet) = table.sheet_mut(name) else {
                continue;
            };

            let (targets, mut job) = match self.prepare(sheet).await {
                Ok(prepared) => prepared,
                Err(outcome) => {
                    outcomes.push(outcome);
                    continue;
                }
            };

            self.poller
                .drive(std::slice::from_mut(&mut job), &self.cancel)
                .await;
            outcomes.push(self.finish(sheet, &targets, job));
        }

        outcomes
    }

    /// Submits every sheet first, then polls all jobs together.
    async fn run_batched(&self, table: &mut Table, selected: &[String]) -> Vec<SheetOutcome> {
        let mut outcomes: Vec<Option<SheetOutcome>> = vec![None; selected.len()];
        let mut pending: Vec<Pending> = Vec::new();
        let mut jobs: Vec<Job> = Vec::new();

        for (slot, name) in selected.iter().enumerate() {
            let Some(sheet) = table.sheet_mut(name) else {
                continue;
            };
            match self.prepare(sheet).await {
                Ok((targets, job)) => {
                    pending.push(Pending { slot, targets });
                    jobs.push(job);
                }
                Err(outcome) => outcomes[slot] = Some(outcome),
            }
        }

        if !jobs.is_empty() {
            info!(jobs = jobs.len(), "Polling submitted jobs together");
            self.poller.drive(&mut jobs, &self.cancel).await;
        }

        for (Pending { slot, targets }, job) in pending.into_iter().zip(jobs) {
            let Some(sheet) = table.sheet_mut(targets.sheet()) else {
                continue;
            };
            outcomes[slot] = Some(self.finish(sheet, &targets, job));
        }

        outcomes.into_iter().flatten().collect()
    }

    /// Extracts and submits one sheet. A sheet that ends here already has its
    /// final outcome.
    async fn prepare(&self, sheet: &mut Sheet) -> Result<(TargetSet, Job), SheetOutcome> {
        if self.cancel.is_cancelled() {
            warn!(sheet = sheet.name(), "Run cancelled before sheet was processed");
            return Err(SheetOutcome::new(sheet.name(), SheetError::Cancelled.status()));
        }

        let targets = RowExtractor::new(&self.layout).extract(sheet);
        if targets.is_empty() {
            info!(sheet = sheet.name(), "No links found, skipping submission");
            return Err(SheetOutcome::no_targets(sheet.name()));
        }

        let title = self.settings.job_title(sheet.name());
        let submitted = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SheetError::Cancelled),
            result = self.submitter.submit(&title, &targets) => result,
        };

        match submitted {
            Ok(job) => Ok((targets, job)),
            Err(err) => Err(Self::failed(sheet.name(), err, 0)),
        }
    }

    /// Turns a terminal job into the sheet's outcome, writing results back
    /// when the job completed.
    fn finish(&self, sheet: &mut Sheet, targets: &TargetSet, mut job: Job) -> SheetOutcome {
        let total = targets.len();
        let err = match job.state().clone() {
            JobState::Completed => {
                let report = job.take_report().unwrap_or_default();
                match reconcile(sheet, self.layout.output_column, targets, &report) {
                    Ok(done) => {
                        self.metrics.increment_rows_written(done.rows_written as u64);
                        return SheetOutcome::new(sheet.name(), SheetStatus::Success)
                            .with_counts(done.positive_targets, total)
                            .with_rows_written(done.rows_written)
                            .with_job(job.id().clone());
                    }
                    Err(err) => SheetError::from(err),
                }
            }
            JobState::TimedOut { attempts } => SheetError::TimedOut { attempts },
            JobState::PollError(reason) => SheetError::PollError(reason),
            JobState::Cancelled => SheetError::Cancelled,
            state @ (JobState::Submitted | JobState::Polling { .. }) => {
                SheetError::PollError(format!("job left polling in state {state}"))
            }
        };

        Self::failed(sheet.name(), err, total).with_job(job.id().clone())
    }

    fn failed(sheet: &str, err: SheetError, total: usize) -> SheetOutcome {
        if matches!(err, SheetError::Cancelled) {
            warn!(sheet, "Sheet cancelled");
        } else {
            error!(sheet, error = %err, "Sheet failed");
        }
        SheetOutcome::new(sheet, err.status())
            .with_counts(0, total)
            .with_detail(err.to_string())
    }
}
