use model::core::identifiers::JobId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct CreateTaskRequest<'a> {
    pub title: &'a str,
    pub urls: &'a [String],
}

/// Code assumed when a create response carries none; anything but `0` is a rejection.
pub const MISSING_CODE: i64 = -1;

fn missing_code() -> i64 {
    MISSING_CODE
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskResponse {
    #[serde(default = "missing_code")]
    pub code: i64,
    #[serde(default)]
    pub task_id: Option<JobId>,
}

#[derive(Debug, Serialize)]
pub struct TaskStatusRequest<'a> {
    pub task_ids: &'a [JobId],
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskStatusResponse {
    #[serde(default)]
    pub result: Vec<TaskStatus>,
}

/// Progress of one job as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskStatus {
    pub id: JobId,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub processed_count: u64,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct TaskReportRequest<'a> {
    pub task_id: &'a JobId,
}

#[derive(Debug, Deserialize)]
pub struct TaskReportResponse {
    pub result: Option<TaskReport>,
}

#[derive(Debug, Deserialize)]
pub struct TaskReport {
    #[serde(default)]
    pub indexed_links: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccountResponse {
    #[serde(default)]
    pub balance: Option<Balance>,
}

#[derive(Debug, Deserialize)]
pub struct Balance {
    #[serde(default)]
    pub checker: Option<f64>,
}
