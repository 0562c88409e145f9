use crate::{
    check::{
        CheckService,
        types::{
            AccountResponse, CreateTaskRequest, CreateTaskResponse, TaskReportRequest,
            TaskReportResponse, TaskStatus, TaskStatusRequest, TaskStatusResponse,
        },
    },
    error::ServiceError,
};
use async_trait::async_trait;
use model::core::identifiers::JobId;
use reqwest::{StatusCode, header::AUTHORIZATION};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.speedyindex.com/v2";
pub const DEFAULT_PROVIDER: &str = "google";

const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub provider: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            provider: DEFAULT_PROVIDER.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the SpeedyIndex checker API.
///
/// Holds a single `reqwest::Client`, so the connection pool is shared by
/// every pipeline that uses this client.
#[derive(Debug, Clone)]
pub struct SpeedyIndexClient {
    http: reqwest::Client,
    base_url: String,
    provider: String,
    api_key: String,
}

impl SpeedyIndexClient {
    pub fn new(config: ClientConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(SpeedyIndexClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            provider: config.provider,
            api_key: config.api_key,
        })
    }

    fn account_url(&self) -> String {
        format!("{}/account", self.base_url)
    }

    fn task_url(&self, action: &str) -> String {
        format!(
            "{}/task/{}/checker/{}",
            self.base_url, self.provider, action
        )
    }

    async fn post<B>(&self, url: &str, body: Option<&B>) -> Result<(StatusCode, String), ServiceError>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self
            .http
            .post(url)
            .header(AUTHORIZATION, self.api_key.as_str());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(url = %url, status = %status, "Check service responded");

        Ok((status, text))
    }

    async fn post_json<B, R>(&self, url: &str, body: Option<&B>) -> Result<R, ServiceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let (status, text) = self.post(url, body).await?;
        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: truncate(&text),
            });
        }
        decode(&text)
    }
}

#[async_trait]
impl CheckService for SpeedyIndexClient {
    async fn balance(&self) -> Result<f64, ServiceError> {
        let response: AccountResponse = self.post_json(&self.account_url(), None::<&()>).await?;
        Ok(response
            .balance
            .and_then(|balance| balance.checker)
            .unwrap_or(0.0))
    }

    async fn create_task(&self, title: &str, urls: &[String]) -> Result<JobId, ServiceError> {
        let request = CreateTaskRequest { title, urls };
        let (status, text) = self.post(&self.task_url("create"), Some(&request)).await?;

        // The payload code decides rejection, whatever the HTTP status says.
        let parsed = decode::<CreateTaskResponse>(&text);
        if let Ok(response) = &parsed
            && response.code != 0
        {
            return Err(ServiceError::Rejected {
                code: response.code,
                body: truncate(&text),
            });
        }

        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: truncate(&text),
            });
        }

        parsed?
            .task_id
            .ok_or_else(|| ServiceError::MalformedBody("missing task_id".to_string()))
    }

    async fn task_status(&self, ids: &[JobId]) -> Result<Vec<TaskStatus>, ServiceError> {
        let request = TaskStatusRequest { task_ids: ids };
        let response: TaskStatusResponse = self
            .post_json(&self.task_url("status"), Some(&request))
            .await?;
        Ok(response.result)
    }

    async fn task_report(&self, id: &JobId) -> Result<Vec<String>, ServiceError> {
        let request = TaskReportRequest { task_id: id };
        let response: TaskReportResponse = self
            .post_json(&self.task_url("report"), Some(&request))
            .await?;
        response
            .result
            .map(|report| report.indexed_links)
            .ok_or_else(|| ServiceError::MalformedBody("missing report result".to_string()))
    }
}

fn decode<R: DeserializeOwned>(text: &str) -> Result<R, ServiceError> {
    serde_json::from_str(text)
        .map_err(|err| ServiceError::MalformedBody(format!("{err}: {}", truncate(text))))
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path},
    };

    async fn client(server: &MockServer) -> SpeedyIndexClient {
        let mut config = ClientConfig::new("secret-key");
        config.base_url = format!("{}/v2/", server.uri());
        config.timeout = Duration::from_secs(5);
        SpeedyIndexClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_create_task_returns_job_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/task/google/checker/create"))
            .and(header("Authorization", "secret-key"))
            .and(body_json(json!({"title": "Run s", "urls": ["https://a.test"]})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": 0, "task_id": "t-1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server)
            .await
            .create_task("Run s", &["https://a.test".to_string()])
            .await
            .unwrap();
        assert_eq!(id.as_str(), "t-1");
    }

    #[tokio::test]
    async fn test_create_task_rejected_by_payload_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/task/google/checker/create"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"code": 2, "message": "not enough balance"})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .create_task("t", &["https://a.test".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Rejected { code: 2, .. }));
    }

    #[tokio::test]
    async fn test_create_task_rejection_wins_over_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/task/google/checker/create"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"code": 1})))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .create_task("t", &[])
            .await
            .unwrap_err();
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn test_create_task_without_code_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/task/google/checker/create"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "invalid api key"})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .create_task("t", &["https://a.test".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Rejected { code: -1, .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/task/google/checker/create"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .create_task("t", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::MalformedBody(_)));
    }

    #[tokio::test]
    async fn test_task_status_batches_ids() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/task/google/checker/status"))
            .and(body_json(json!({"task_ids": ["a", "b"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [
                    {"id": "a", "is_completed": true, "processed_count": 2, "size": 2},
                    {"id": "b", "is_completed": false, "processed_count": 1, "size": 4}
                ]
            })))
            .mount(&server)
            .await;

        let statuses = client(&server)
            .await
            .task_status(&[JobId::from("a"), JobId::from("b")])
            .await
            .unwrap();
        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].is_completed);
        assert_eq!(statuses[1].processed_count, 1);
        assert_eq!(statuses[1].size, 4);
    }

    #[tokio::test]
    async fn test_task_report_and_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/task/google/checker/report"))
            .and(body_json(json!({"task_id": "a"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"indexed_links": ["https://a.test"]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2/task/google/checker/report"))
            .and(body_json(json!({"task_id": "b"})))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let links = client.task_report(&JobId::from("a")).await.unwrap();
        assert_eq!(links, vec!["https://a.test".to_string()]);

        let err = client.task_report(&JobId::from("b")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_balance_reads_checker_figure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/account"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"balance": {"indexer": 5, "checker": 1500}})),
            )
            .mount(&server)
            .await;

        let balance = client(&server).await.balance().await.unwrap();
        assert_eq!(balance, 1500.0);
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let mut config = ClientConfig::new("k");
        config.base_url = "http://127.0.0.1:9".to_string();
        config.timeout = Duration::from_secs(2);
        let client = SpeedyIndexClient::new(config).unwrap();

        let err = client.task_status(&[JobId::from("x")]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Transport(_)));
    }

    #[test]
    fn test_truncate_long_bodies() {
        let long = "x".repeat(MAX_ERROR_BODY + 10);
        assert_eq!(truncate(&long).len(), MAX_ERROR_BODY + 3);
        assert_eq!(truncate("short"), "short");
    }
}
