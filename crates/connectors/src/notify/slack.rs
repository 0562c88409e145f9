use crate::{error::NotifyError, notify::Notifier};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts messages to a Slack channel through `chat.postMessage`.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    http: reqwest::Client,
    endpoint: String,
    token: String,
    channel: String,
}

impl SlackNotifier {
    pub fn new(token: impl Into<String>, channel: impl Into<String>) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(SlackNotifier {
            http,
            endpoint: SLACK_POST_MESSAGE_URL.to_string(),
            token: token.into(),
            channel: channel.into(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&PostMessage {
                channel: &self.channel,
                text,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: PostMessageResponse = response.json().await?;
        if body.ok {
            Ok(())
        } else {
            Err(NotifyError::Rejected(
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::notify_best_effort;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path},
    };

    #[tokio::test]
    async fn test_posts_channel_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat.postMessage"))
            .and(header("Authorization", "Bearer xoxb-1"))
            .and(body_json(json!({"channel": "C1", "text": "hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = SlackNotifier::new("xoxb-1", "C1")
            .unwrap()
            .with_endpoint(format!("{}/api/chat.postMessage", server.uri()));
        notifier.notify("hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_slack_error_is_rejected_and_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": false, "error": "channel_not_found"})),
            )
            .mount(&server)
            .await;

        let notifier = SlackNotifier::new("t", "C404")
            .unwrap()
            .with_endpoint(server.uri());

        let err = notifier.notify("x").await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected(ref e) if e == "channel_not_found"));
        assert!(!notify_best_effort(&notifier, "x").await);
    }
}
