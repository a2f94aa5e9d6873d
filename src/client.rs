//! Assistant API client for backend communication.
//!
//! Thin wrapper over [`HttpClient`] for the three backend endpoints:
//! `GET /status`, `POST /chat/stream` and `POST /chat/clear`.

use std::sync::Arc;

use crate::adapters::ReqwestHttpClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{ChatRequest, StatusResponse};
use crate::traits::{ByteStream, Headers, HttpClient, HttpError};

pub const STATUS_PATH: &str = "/status";
pub const STREAM_PATH: &str = "/chat/stream";
pub const CLEAR_PATH: &str = "/chat/clear";

/// Client for interacting with the assistant backend.
#[derive(Clone)]
pub struct AssistantClient {
    config: ClientConfig,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for AssistantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl AssistantClient {
    /// Create a client backed by reqwest.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = ReqwestHttpClient::from_config(&config)?;
        Ok(Self::with_http(config, Arc::new(http)))
    }

    /// Create a client over any HttpClient implementation.
    pub fn with_http(config: ClientConfig, http: Arc<dyn HttpClient>) -> Self {
        Self { config, http }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn json_headers() -> Headers {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }

    /// Fetch the backend status.
    pub async fn status(&self) -> ClientResult<StatusResponse> {
        let url = self.config.endpoint(STATUS_PATH);
        let response = self.http.get(&url, &Headers::new()).await?;

        if !response.is_success() {
            return Err(ClientError::ServerError {
                status: response.status,
                message: response.text().unwrap_or_default(),
            });
        }

        Ok(response.json()?)
    }

    /// Connectivity probe: true only when the backend reports `"ready"`.
    pub async fn is_ready(&self) -> bool {
        match self.status().await {
            Ok(status) => {
                tracing::debug!(status = %status.status, "Backend status");
                status.is_ready()
            }
            Err(e) => {
                tracing::debug!(error = %e, "Status check failed");
                false
            }
        }
    }

    /// Open the chat stream for one user message.
    ///
    /// The returned stream yields the raw response body; dropping it closes
    /// the connection.
    pub async fn open_stream(&self, message: &str) -> Result<ByteStream, HttpError> {
        let url = self.config.endpoint(STREAM_PATH);
        let body = serde_json::to_string(&ChatRequest::new(message))
            .map_err(|e| HttpError::Other(e.to_string()))?;

        let mut headers = Self::json_headers();
        headers.insert("Accept".to_string(), "text/event-stream".to_string());

        self.http.post_stream(&url, &body, &headers).await
    }

    /// Ask the backend to clear its conversation memory.
    ///
    /// Any HTTP response counts as acknowledged; only transport failures are
    /// errors.
    pub async fn clear(&self) -> ClientResult<()> {
        let url = self.config.endpoint(CLEAR_PATH);
        let response = self.http.post(&url, "", &Self::json_headers()).await?;

        if !response.is_success() {
            tracing::warn!(status = response.status, "Clear request returned non-success status");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::Response;
    use bytes::Bytes;

    const BASE: &str = "http://backend:8000";

    fn client_with(mock: &MockHttpClient) -> AssistantClient {
        let config = ClientConfig::new().with_base_url(BASE).unwrap();
        AssistantClient::with_http(config, Arc::new(mock.clone()))
    }

    #[test]
    fn test_assistant_client_base_url() {
        let client = client_with(&MockHttpClient::new());
        assert_eq!(client.base_url(), BASE);
    }

    #[test]
    fn test_assistant_client_new_with_reqwest() {
        let client = AssistantClient::new(ClientConfig::default()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_status_ready() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://backend:8000/status",
            MockResponse::Success(Response::new(200, Bytes::from(r#"{"status":"ready"}"#))),
        );
        let client = client_with(&mock);

        assert_eq!(client.status().await.unwrap().status, "ready");
        assert!(client.is_ready().await);
    }

    #[tokio::test]
    async fn test_status_not_ready() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://backend:8000/status",
            MockResponse::Success(Response::new(200, Bytes::from(r#"{"status":"starting"}"#))),
        );
        assert!(!client_with(&mock).is_ready().await);
    }

    #[tokio::test]
    async fn test_status_error_status_code() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://backend:8000/status",
            MockResponse::Success(Response::new(503, Bytes::from("down"))),
        );
        let client = client_with(&mock);

        match client.status().await {
            Err(ClientError::ServerError { status, .. }) => assert_eq!(status, 503),
            other => panic!("Expected ServerError, got {:?}", other),
        }
        assert!(!client.is_ready().await);
    }

    #[tokio::test]
    async fn test_status_bad_json() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://backend:8000/status",
            MockResponse::Success(Response::new(200, Bytes::from("<html>"))),
        );
        let result = client_with(&mock).status().await;
        assert!(matches!(result, Err(ClientError::Json(_))));
    }

    #[tokio::test]
    async fn test_status_transport_failure() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://backend:8000/status",
            MockResponse::Error(HttpError::ConnectionFailed("refused".to_string())),
        );
        assert!(!client_with(&mock).is_ready().await);
    }

    #[tokio::test]
    async fn test_open_stream_sends_message_body() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://backend:8000/chat/stream",
            MockResponse::Stream(vec![Bytes::from("data: {\"type\":\"done\"}\n")]),
        );
        let client = client_with(&mock);

        let _stream = client.open_stream("Analyze backlinks for example.com").await.unwrap();

        let requests = mock.requests_to(STREAM_PATH);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(
            requests[0].body.as_deref(),
            Some(r#"{"message":"Analyze backlinks for example.com"}"#)
        );
        assert_eq!(
            requests[0].headers.get("Content-Type"),
            Some(&"application/json".to_string())
        );
        assert_eq!(
            requests[0].headers.get("Accept"),
            Some(&"text/event-stream".to_string())
        );
    }

    #[tokio::test]
    async fn test_clear_accepts_any_status() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://backend:8000/chat/clear",
            MockResponse::Success(Response::new(500, Bytes::new())),
        );
        assert!(client_with(&mock).clear().await.is_ok());
    }

    #[tokio::test]
    async fn test_clear_transport_failure() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://backend:8000/chat/clear",
            MockResponse::Error(HttpError::ConnectionFailed("refused".to_string())),
        );
        assert!(matches!(
            client_with(&mock).clear().await,
            Err(ClientError::Http(_))
        ));
    }
}
