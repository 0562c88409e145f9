use connectors::check::{CheckService, TaskStatus};
use engine_core::{
    metrics::Metrics,
    retry::{PollPolicy, TickOutcome},
};
use futures::future::join_all;
use model::{
    core::identifiers::JobId,
    execution::job::{CompletionReport, Job},
};
use std::{collections::HashMap, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drives jobs from `Submitted` to a terminal state.
///
/// All live jobs share one status request per tick. Each job keeps its own
/// attempt budget: a tick that does not complete a job costs it one
/// attempt, whether the service said "not yet", forgot the job, or the
/// request failed altogether.
pub struct JobPoller {
    service: Arc<dyn CheckService>,
    policy: PollPolicy,
    metrics: Metrics,
}

impl JobPoller {
    pub fn new(service: Arc<dyn CheckService>, policy: PollPolicy, metrics: Metrics) -> Self {
        Self {
            service,
            policy,
            metrics,
        }
    }

    /// Polls until every job is terminal. Returns once `cancel` fires, with
    /// all unfinished jobs marked cancelled.
    pub async fn drive(&self, jobs: &mut [Job], cancel: &CancellationToken) {
        for job in jobs.iter_mut() {
            job.start_polling();
        }

        while jobs.iter().any(Job::is_polling) {
            let ticked = self.policy.pause(cancel).await
                && tokio::select! {
                    biased;
                    _ = cancel.cancelled() => false,
                    _ = self.tick(jobs) => true,
                };

            if !ticked {
                Self::cancel_live(jobs);
                break;
            }
        }
    }

    async fn tick(&self, jobs: &mut [Job]) {
        let ids: Vec<JobId> = jobs
            .iter()
            .filter(|job| job.is_polling())
            .map(|job| job.id().clone())
            .collect();
        self.metrics.increment_poll_ticks(1);

        let statuses = match self.service.task_status(&ids).await {
            Ok(statuses) => statuses,
            Err(err) => {
                warn!(error = %err, jobs = ids.len(), "Status poll failed, will retry");
                self.metrics.increment_poll_failures(1);
                for job in jobs.iter_mut().filter(|job| job.is_polling()) {
                    self.spend_attempt(job);
                }
                return;
            }
        };

        let by_id: HashMap<&JobId, &TaskStatus> =
            statuses.iter().map(|status| (&status.id, status)).collect();

        let mut ready: Vec<usize> = Vec::new();
        for (idx, job) in jobs.iter_mut().enumerate() {
            if !job.is_polling() {
                continue;
            }
            let verdict = Self::evaluate(job, by_id.get(job.id()).copied());
            match verdict {
                TickOutcome::Terminal(()) => ready.push(idx),
                TickOutcome::Retry => self.spend_attempt(job),
            }
        }

        if !ready.is_empty() {
            self.collect_reports(jobs, &ready).await;
        }
    }

    fn evaluate(job: &Job, status: Option<&TaskStatus>) -> TickOutcome<()> {
        match status {
            Some(status) if status.is_completed => TickOutcome::Terminal(()),
            Some(status) => {
                info!(
                    sheet = job.sheet(),
                    job_id = %job.id(),
                    processed = status.processed_count,
                    size = status.size,
                    "Checking..."
                );
                TickOutcome::Retry
            }
            None => {
                debug!(
                    sheet = job.sheet(),
                    job_id = %job.id(),
                    "Job missing from status response"
                );
                TickOutcome::Retry
            }
        }
    }

    async fn collect_reports(&self, jobs: &mut [Job], ready: &[usize]) {
        let ids: Vec<JobId> = ready.iter().map(|idx| jobs[*idx].id().clone()).collect();
        let reports = join_all(ids.iter().map(|id| self.service.task_report(id))).await;

        for (idx, report) in ready.iter().zip(reports) {
            let job = &mut jobs[*idx];
            match report {
                Ok(links) => {
                    self.metrics.increment_reports(1);
                    info!(
                        sheet = job.sheet(),
                        job_id = %job.id(),
                        positives = links.len(),
                        "Job completed"
                    );
                    job.complete(CompletionReport::new(links));
                }
                Err(err) => {
                    warn!(
                        sheet = job.sheet(),
                        job_id = %job.id(),
                        error = %err,
                        "Report fetch failed"
                    );
                    job.fail(err.to_string());
                }
            }
        }
    }

    fn spend_attempt(&self, job: &mut Job) {
        let attempts = job.record_attempt();
        if self.policy.is_exhausted(attempts) {
            warn!(
                sheet = job.sheet(),
                job_id = %job.id(),
                attempts,
                "Giving up on job"
            );
            job.time_out();
        }
    }

    fn cancel_live(jobs: &mut [Job]) {
        for job in jobs.iter_mut().filter(|job| !job.is_terminal()) {
            info!(sheet = job.sheet(), job_id = %job.id(), "Polling cancelled");
            job.cancel();
        }
    }
}
