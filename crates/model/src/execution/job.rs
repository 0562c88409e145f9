use crate::{core::identifiers::JobId, execution::target::Target};
use serde::Serialize;
use std::{collections::HashSet, fmt};

/// Lifecycle of a remote job.
///
/// `Submitted -> Polling -> {Completed | TimedOut | PollError | Cancelled}`.
/// The last four are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum JobState {
    Submitted,
    Polling { attempts: u32 },
    Completed,
    TimedOut { attempts: u32 },
    PollError(String),
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed
                | JobState::TimedOut { .. }
                | JobState::PollError(_)
                | JobState::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Submitted => "Submitted",
            JobState::Polling { .. } => "Polling",
            JobState::Completed => "Completed",
            JobState::TimedOut { .. } => "TimedOut",
            JobState::PollError(_) => "PollError",
            JobState::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of targets the remote service confirmed positive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    positives: HashSet<String>,
}

impl CompletionReport {
    pub fn new<I, S>(links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CompletionReport {
            positives: links.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact string membership; no normalization is applied.
    pub fn is_positive(&self, target: &Target) -> bool {
        self.positives.contains(target.as_str())
    }

    pub fn positives(&self) -> impl Iterator<Item = &str> {
        self.positives.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.positives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positives.is_empty()
    }
}

/// One remote unit of work created from exactly one target set.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    id: JobId,
    sheet: String,
    submitted: usize,
    state: JobState,
    report: Option<CompletionReport>,
}

impl Job {
    pub fn new(id: JobId, sheet: impl Into<String>, submitted: usize) -> Self {
        Job {
            id,
            sheet: sheet.into(),
            submitted,
            state: JobState::Submitted,
            report: None,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn report(&self) -> Option<&CompletionReport> {
        self.report.as_ref()
    }

    pub fn take_report(&mut self) -> Option<CompletionReport> {
        self.report.take()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_polling(&self) -> bool {
        matches!(self.state, JobState::Polling { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self.state {
            JobState::Polling { attempts } | JobState::TimedOut { attempts } => attempts,
            _ => 0,
        }
    }

    /// `Submitted -> Polling`. Returns `false` when the job was not freshly submitted.
    pub fn start_polling(&mut self) -> bool {
        if self.state != JobState::Submitted {
            return false;
        }
        self.state = JobState::Polling { attempts: 0 };
        true
    }

    /// Counts one unsuccessful poll tick and returns the new total.
    pub fn record_attempt(&mut self) -> u32 {
        if let JobState::Polling { attempts } = &mut self.state {
            *attempts += 1;
            *attempts
        } else {
            self.attempts()
        }
    }

    pub fn complete(&mut self, report: CompletionReport) -> bool {
        if !self.finish(JobState::Completed) {
            return false;
        }
        self.report = Some(report);
        true
    }

    pub fn time_out(&mut self) -> bool {
        let attempts = self.attempts();
        self.finish(JobState::TimedOut { attempts })
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        self.finish(JobState::PollError(reason.into()))
    }

    pub fn cancel(&mut self) -> bool {
        self.finish(JobState::Cancelled)
    }

    fn finish(&mut self, next: JobState) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new(JobId::from("t-1"), "Backlinks", 3)
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = job();
        assert_eq!(job.state(), &JobState::Submitted);
        assert!(job.start_polling());
        assert_eq!(job.record_attempt(), 1);
        assert_eq!(job.record_attempt(), 2);
        assert!(job.complete(CompletionReport::new(["https://a.test"])));
        assert_eq!(job.state(), &JobState::Completed);
        assert_eq!(job.report().map(CompletionReport::len), Some(1));
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut job = job();
        job.start_polling();
        job.record_attempt();
        assert!(job.time_out());
        assert_eq!(job.state(), &JobState::TimedOut { attempts: 1 });

        assert!(!job.complete(CompletionReport::default()));
        assert!(!job.fail("late"));
        assert!(!job.cancel());
        assert!(!job.start_polling());
        assert!(job.report().is_none());
        assert_eq!(job.state(), &JobState::TimedOut { attempts: 1 });
    }

    #[test]
    fn test_report_membership_is_exact() {
        let report = CompletionReport::new(["https://a.test/"]);
        assert!(report.is_positive(&Target::parse("https://a.test/").unwrap()));
        assert!(!report.is_positive(&Target::parse("https://a.test").unwrap()));
        assert!(!report.is_positive(&Target::parse("HTTPS://a.test/").unwrap()));
    }
}
