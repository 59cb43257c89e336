//! HTTP transport seam and its reqwest-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::catalog::HttpMethod;
use crate::types::{OctoparseError, OctoparseResult};

/// Default per-request timeout for [`ReqwestTransport`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("octoparse-rs/", env!("CARGO_PKG_VERSION"));

/// A fully-built outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// JSON body, sent only when present.
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Injected HTTP capability. Implementations return the parsed response body
/// for 2xx responses and an error for everything else.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> OctoparseResult<Value>;
}

/// Transport over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> OctoparseResult<Value> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(OctoparseError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(parse_body(&text))
    }
}

/// Parse a response body as JSON. Empty bodies become `null`, non-JSON
/// bodies are kept as a string.
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
pub(crate) mod recording {
    //! In-memory transport that records requests and replays canned replies.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    pub struct RecordingTransport {
        replies: Mutex<VecDeque<Result<Value, (u16, String)>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self {
                replies: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn reply(self, body: Value) -> Self {
            self.replies.lock().unwrap().push_back(Ok(body));
            self
        }

        pub fn fail(self, status: u16, body: &str) -> Self {
            self.replies
                .lock()
                .unwrap()
                .push_back(Err((status, body.to_string())));
            self
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn send(&self, request: HttpRequest) -> OctoparseResult<Value> {
            self.requests.lock().unwrap().push(request);
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(body)) => Ok(body),
                Some(Err((status, body))) => Err(OctoparseError::Status { status, body }),
                None => Err(OctoparseError::Transport("no reply queued".to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_body_variants() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("  \n"), Value::Null);
        assert_eq!(parse_body(r#"{"a":1}"#), json!({ "a": 1 }));
        assert_eq!(parse_body("OK"), json!("OK"));
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let req = HttpRequest::new(HttpMethod::Get, "http://x").with_header("Accept", "application/json");
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("authorization"), None);
    }

    #[tokio::test]
    async fn test_get_with_headers_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/task/search"))
            .and(query_param("taskGroupId", "G 1"))
            .and(header("authorization", "Bearer T"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [1] })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::default();
        let req = HttpRequest::new(
            HttpMethod::Get,
            format!("{}/task/search?taskGroupId=G%201", server.uri()),
        )
        .with_header("Authorization", "Bearer T");

        let body = transport.send(req).await.unwrap();
        assert_eq!(body, json!({ "data": [1] }));
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/data/remove"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "taskId": "T1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "requestId": "r" })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::default();
        let req = HttpRequest::new(HttpMethod::Post, format!("{}/data/remove", server.uri()))
            .with_header("Content-Type", "application/json")
            .with_json(json!({ "taskId": "T1" }));

        let body = transport.send(req).await.unwrap();
        assert_eq!(body["requestId"], "r");
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/taskGroup"))
            .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::default();
        let req = HttpRequest::new(HttpMethod::Get, format!("{}/taskGroup", server.uri()));
        let err = transport.send(req).await.unwrap_err();
        match err {
            OctoparseError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "expired");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let transport = ReqwestTransport::new(Duration::from_secs(2));
        let req = HttpRequest::new(HttpMethod::Get, "http://127.0.0.1:1/taskGroup");
        let err = transport.send(req).await.unwrap_err();
        assert!(err.is_transport_error());
    }
}
