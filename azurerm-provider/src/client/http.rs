//! HTTP implementation of [`ArmClient`]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value as Json;
use url::Url;

use super::auth::TokenCredential;
use super::{ArmClient, ArmError, ArmResult};

/// Maximum length of response body to log
const MAX_LOG_BODY_LENGTH: usize = 200;

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";
const LOCATION: &str = "location";

fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };
    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Build an [`ArmError::Status`] from a failed response body
fn status_error(status: StatusCode, body: &str) -> ArmError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error);
    let (code, message) = match detail {
        Some(d) => (d.code, d.message),
        None => (
            status.canonical_reason().unwrap_or("Unknown").to_string(),
            sanitize_for_log(body),
        ),
    };
    ArmError::Status {
        status: status.as_u16(),
        code,
        message,
    }
}

/// Status document returned by an `Azure-AsyncOperation` URL
#[derive(Debug, Deserialize)]
struct OperationStatus {
    status: String,
    error: Option<ErrorDetail>,
}

#[derive(Debug, PartialEq)]
enum PollState {
    Running,
    Succeeded,
    Failed(String, String),
}

fn poll_state(doc: &OperationStatus) -> PollState {
    match doc.status.as_str() {
        s if s.eq_ignore_ascii_case("succeeded") => PollState::Succeeded,
        s if s.eq_ignore_ascii_case("failed") || s.eq_ignore_ascii_case("canceled") => {
            let message = doc
                .error
                .as_ref()
                .map(|e| format!("{}: {}", e.code, e.message))
                .unwrap_or_default();
            PollState::Failed(doc.status.clone(), message)
        }
        _ => PollState::Running,
    }
}

/// `Retry-After` in seconds, if the response carries one
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Where to poll a long-running operation
#[derive(Debug, Clone, PartialEq)]
enum PollTarget {
    AsyncOperation(String),
    Location(String),
}

fn poll_target(headers: &HeaderMap) -> Option<PollTarget> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    header(AZURE_ASYNC_OPERATION)
        .map(PollTarget::AsyncOperation)
        .or_else(|| header(LOCATION).map(PollTarget::Location))
}

/// Polling limits for long-running operations
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: 120,
            delay: Duration::from_secs(5),
        }
    }
}

/// ARM client over reqwest
pub struct HttpArmClient {
    client: Client,
    endpoint: String,
    credential: Arc<dyn TokenCredential>,
    poll: PollSettings,
}

impl HttpArmClient {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        credential: Arc<dyn TokenCredential>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            credential,
            poll: PollSettings::default(),
        }
    }

    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    fn resource_url(&self, id: &str, api_version: &str) -> ArmResult<Url> {
        let base = format!("{}{}", self.endpoint.trim_end_matches('/'), id);
        let mut url = Url::parse(&base)
            .map_err(|e| ArmError::Transport(format!("invalid URL {:?}: {}", base, e)))?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Json>) -> ArmResult<Response> {
        debug!("{} {}", method, url);
        let token = self.credential.token().await?;
        let mut request = self.client.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    async fn read_body(response: Response) -> ArmResult<(StatusCode, HeaderMap, String)> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok((status, headers, body))
    }

    fn parse_json(body: &str) -> ArmResult<Json> {
        if body.trim().is_empty() {
            return Ok(Json::Null);
        }
        Ok(serde_json::from_str(body)?)
    }

    /// Wait for a long-running operation to reach a terminal state
    async fn wait_for_operation(&self, target: PollTarget, first_delay: Option<Duration>) -> ArmResult<()> {
        let mut delay = first_delay.unwrap_or(self.poll.delay);

        for attempt in 0..self.poll.max_attempts {
            tokio::time::sleep(delay).await;

            let url = match &target {
                PollTarget::AsyncOperation(u) | PollTarget::Location(u) => Url::parse(u)
                    .map_err(|e| ArmError::Transport(format!("invalid polling URL: {}", e)))?,
            };
            let response = self.send(Method::GET, url, None).await?;
            let (status, headers, body) = Self::read_body(response).await?;
            delay = retry_after(&headers).unwrap_or(self.poll.delay);
            debug!("poll attempt {} returned {}", attempt + 1, status);

            match &target {
                PollTarget::AsyncOperation(_) => {
                    if !status.is_success() {
                        return Err(status_error(status, &body));
                    }
                    let doc: OperationStatus = serde_json::from_str(&body)?;
                    match poll_state(&doc) {
                        PollState::Succeeded => return Ok(()),
                        PollState::Failed(status, message) => {
                            return Err(ArmError::OperationFailed { status, message });
                        }
                        PollState::Running => {}
                    }
                }
                PollTarget::Location(_) => match status {
                    StatusCode::ACCEPTED => {}
                    s if s.is_success() => return Ok(()),
                    s => return Err(status_error(s, &body)),
                },
            }
        }

        Err(ArmError::OperationTimedOut {
            attempts: self.poll.max_attempts,
        })
    }
}

#[async_trait]
impl ArmClient for HttpArmClient {
    async fn get(&self, id: &str, api_version: &str) -> ArmResult<Option<Json>> {
        let url = self.resource_url(id, api_version)?;
        let response = self.send(Method::GET, url, None).await?;
        let (status, _, body) = Self::read_body(response).await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            warn!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(status_error(status, &body));
        }
        Self::parse_json(&body).map(Some)
    }

    async fn put(&self, id: &str, api_version: &str, body: &Json) -> ArmResult<Json> {
        let url = self.resource_url(id, api_version)?;
        let response = self.send(Method::PUT, url, Some(body)).await?;
        let (status, headers, text) = Self::read_body(response).await?;

        if !status.is_success() {
            warn!("API error: {} - {}", status, sanitize_for_log(&text));
            return Err(status_error(status, &text));
        }

        if matches!(status, StatusCode::CREATED | StatusCode::ACCEPTED)
            && let Some(target) = poll_target(&headers)
        {
            self.wait_for_operation(target, retry_after(&headers)).await?;
        }

        match self.get(id, api_version).await? {
            Some(resource) => Ok(resource),
            None => Self::parse_json(&text),
        }
    }

    async fn action(&self, id: &str, action: &str, api_version: &str) -> ArmResult<Option<Json>> {
        let path = format!("{}/{}", id.trim_end_matches('/'), action);
        let url = self.resource_url(&path, api_version)?;
        let response = self.send(Method::POST, url, Some(&Json::Object(Default::default()))).await?;
        let (status, _, body) = Self::read_body(response).await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            warn!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(status_error(status, &body));
        }
        Self::parse_json(&body).map(Some)
    }

    async fn delete(&self, id: &str, api_version: &str) -> ArmResult<()> {
        let url = self.resource_url(id, api_version)?;
        let response = self.send(Method::DELETE, url, None).await?;
        let (status, headers, text) = Self::read_body(response).await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        if !status.is_success() {
            warn!("API error: {} - {}", status, sanitize_for_log(&text));
            return Err(status_error(status, &text));
        }

        if status == StatusCode::ACCEPTED
            && let Some(target) = poll_target(&headers)
        {
            self.wait_for_operation(target, retry_after(&headers)).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::auth::StaticTokenCredential;
    use reqwest::header::HeaderValue;

    fn client() -> HttpArmClient {
        HttpArmClient::new(
            Client::new(),
            "https://management.azure.com/",
            Arc::new(StaticTokenCredential::new("token")),
        )
    }

    #[test]
    fn resource_url_appends_api_version() {
        let url = client()
            .resource_url(
                "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Media/mediaServices/acct",
                "2021-11-01",
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://management.azure.com/subscriptions/s/resourceGroups/rg/providers/Microsoft.Media/mediaServices/acct?api-version=2021-11-01"
        );
    }

    #[test]
    fn status_error_reads_arm_error_envelope() {
        let err = status_error(
            StatusCode::CONFLICT,
            r#"{"error":{"code":"Conflict","message":"already in use"}}"#,
        );
        assert_eq!(
            err.to_string(),
            "unexpected status 409 with error: Conflict: already in use"
        );
    }

    #[test]
    fn status_error_falls_back_to_reason() {
        let err = status_error(StatusCode::NOT_FOUND, "");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn poll_target_prefers_async_operation_header() {
        let mut headers = HeaderMap::new();
        headers.insert("Location", HeaderValue::from_static("https://example/loc"));
        assert_eq!(
            poll_target(&headers),
            Some(PollTarget::Location("https://example/loc".to_string()))
        );
        headers.insert(
            "Azure-AsyncOperation",
            HeaderValue::from_static("https://example/op"),
        );
        assert_eq!(
            poll_target(&headers),
            Some(PollTarget::AsyncOperation("https://example/op".to_string()))
        );
    }

    #[test]
    fn retry_after_parses_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(7)));
    }

    #[test]
    fn poll_state_maps_terminal_statuses() {
        let doc: OperationStatus = serde_json::from_str(r#"{"status":"InProgress"}"#).unwrap();
        assert_eq!(poll_state(&doc), PollState::Running);

        let doc: OperationStatus = serde_json::from_str(r#"{"status":"Succeeded"}"#).unwrap();
        assert_eq!(poll_state(&doc), PollState::Succeeded);

        let doc: OperationStatus = serde_json::from_str(
            r#"{"status":"Failed","error":{"code":"InternalError","message":"boom"}}"#,
        )
        .unwrap();
        assert_eq!(
            poll_state(&doc),
            PollState::Failed("Failed".to_string(), "InternalError: boom".to_string())
        );
    }

    #[test]
    fn sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(200)));
        assert!(sanitized.ends_with("[truncated, 500 bytes total]"));
    }
}
