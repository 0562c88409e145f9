use crate::error::SheetError;
use connectors::check::CheckService;
use engine_core::metrics::Metrics;
use model::execution::{job::Job, target::TargetSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Turns a sheet's target set into one remote job.
pub struct JobSubmitter {
    service: Arc<dyn CheckService>,
    metrics: Metrics,
}

impl JobSubmitter {
    pub fn new(service: Arc<dyn CheckService>, metrics: Metrics) -> Self {
        Self { service, metrics }
    }

    /// Submits the distinct targets of `targets` in first-seen order.
    ///
    /// An empty set is refused without contacting the service.
    pub async fn submit(&self, title: &str, targets: &TargetSet) -> Result<Job, SheetError> {
        if targets.is_empty() {
            return Err(SheetError::NoTargets(targets.sheet().to_string()));
        }

        let urls = targets.urls();
        let id = self
            .service
            .create_task(title, &urls)
            .await
            .map_err(|err| {
                warn!(sheet = targets.sheet(), error = %err, "Job submission failed");
                SheetError::from_submission(err)
            })?;

        self.metrics.increment_jobs(1);
        self.metrics.increment_targets(urls.len() as u64);
        info!(
            sheet = targets.sheet(),
            job_id = %id,
            targets = urls.len(),
            "Submitted job"
        );

        Ok(Job::new(id, targets.sheet(), urls.len()))
    }
}
