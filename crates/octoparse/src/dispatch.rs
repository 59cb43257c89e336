//! Operation dispatch: request descriptor → HTTP call → normalized records.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::catalog::{route, HttpMethod, ParamKind, ParamSpec, Placement, Route};
use crate::normalize::normalize;
use crate::token::{TokenCache, TokenProvider};
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};
use crate::types::{
    AccessToken, Credentials, OctoparseError, OctoparseResult, OperationRequest, OutputRecord,
    ParamValue,
};

/// Query pairs and JSON body resolved for one request, before authentication.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCall {
    pub method: HttpMethod,
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl PreparedCall {
    /// Place every declared parameter of the route, applying defaults.
    pub fn resolve(route: &Route, request: &OperationRequest) -> OctoparseResult<Self> {
        let mut query = Vec::new();
        let mut body = Map::new();

        for spec in route.params {
            let value = match spec.kind {
                ParamKind::Text => Value::String(text_param(spec, request.param(spec.input))?),
                ParamKind::List => Value::from(list_param(request.param(spec.input))),
            };

            match spec.placement {
                Placement::Query => {
                    if let Value::String(s) = value {
                        query.push((spec.wire, s));
                    }
                }
                Placement::Body => {
                    body.insert(spec.wire.to_string(), value);
                }
            }
        }

        Ok(Self {
            method: route.method,
            path: route.path,
            query,
            body: (!body.is_empty()).then_some(Value::Object(body)),
        })
    }

    /// `base_url + path`, with percent-encoded query pairs in declared order.
    pub fn url(&self, base_url: &str) -> String {
        let mut url = format!("{base_url}{}", self.path);
        if !self.query.is_empty() {
            let pairs: Vec<String> = self
                .query
                .iter()
                .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
                .collect();
            url.push('?');
            url.push_str(&pairs.join("&"));
        }
        url
    }

    /// Attach the standard headers and bearer token.
    pub fn into_http_request(self, base_url: &str, token: &AccessToken) -> HttpRequest {
        let url = self.url(base_url);
        let mut request = HttpRequest::new(self.method, url)
            .with_header("Authorization", token.bearer())
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "application/json");
        if let Some(body) = self.body {
            request = request.with_json(body);
        }
        request
    }
}

fn text_param(spec: &ParamSpec, value: Option<&ParamValue>) -> OctoparseResult<String> {
    let supplied = match value {
        Some(ParamValue::Text(s)) => Some(s.clone()),
        Some(ParamValue::List(items)) if items.len() == 1 => Some(items[0].clone()),
        Some(ParamValue::List(items)) if !items.is_empty() => {
            return Err(OctoparseError::InvalidParameter {
                name: spec.input.to_string(),
                reason: format!("expected a single value, got {}", items.len()),
            });
        }
        _ => None,
    };

    match (supplied.filter(|s| !s.is_empty()), spec.default) {
        (Some(s), _) => Ok(s),
        (None, Some(default)) => Ok(default.to_string()),
        (None, None) => Err(OctoparseError::MissingParameter(spec.input.to_string())),
    }
}

fn list_param(value: Option<&ParamValue>) -> Vec<String> {
    match value {
        Some(ParamValue::List(items)) => items.clone(),
        Some(ParamValue::Text(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Maps operation requests onto HTTP calls through an injected transport.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Dispatcher backed by a fresh reqwest client.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(Arc::new(ReqwestTransport::new(timeout)))
    }

    pub fn tokens(&self) -> TokenProvider<'_> {
        TokenProvider::new(self.transport.as_ref())
    }

    /// Run one operation and return its output records.
    ///
    /// Performs at most two sequential calls: the token exchange on a cache
    /// miss, then the operation itself. Nothing is retried.
    pub async fn dispatch(
        &self,
        request: &OperationRequest,
        credentials: &Credentials,
        cache: &mut TokenCache,
    ) -> OctoparseResult<Vec<OutputRecord>> {
        let route = route(request.operation());
        let call = PreparedCall::resolve(&route, request)?;

        let token = self.tokens().get_access_token(credentials, cache).await?;
        let http = call.into_http_request(credentials.base_url(), &token);

        tracing::debug!(
            "{}/{} → {} {}",
            request.resource(),
            request.operation(),
            http.method.as_str(),
            http.url
        );

        let response = match self.transport.send(http).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("{} failed: {e}", request.operation());
                return Err(e);
            }
        };

        Ok(normalize(response, route.normalize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::recording::RecordingTransport;
    use crate::types::{Operation, Resource};
    use serde_json::json;

    const BASE: &str = "https://api.test";

    fn creds() -> Credentials {
        Credentials::new("alice", "secret")
            .with_base_url(BASE)
            .with_access_token("TOKEN")
    }

    async fn run(
        request: OperationRequest,
        reply: Value,
    ) -> (OctoparseResult<Vec<OutputRecord>>, Vec<HttpRequest>) {
        let transport = Arc::new(RecordingTransport::new().reply(reply));
        let dispatcher = Dispatcher::new(transport.clone());
        let mut cache = TokenCache::new();
        let result = dispatcher.dispatch(&request, &creds(), &mut cache).await;
        (result, transport.requests())
    }

    #[tokio::test]
    async fn test_copy_task_scenario() {
        let request = OperationRequest::parse("tasks", "copyTask")
            .unwrap()
            .with_param("taskGroupId", "G1")
            .with_param("taskId", "T1");

        let (result, requests) = run(request, json!({ "data": [{ "id": 1 }] })).await;

        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://api.test/task/copy?taskGroupId=G1&taskId=T1");
        assert_eq!(req.header("authorization"), Some("Bearer TOKEN"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.body, None);

        let records = result.unwrap();
        assert_eq!(records, vec![OutputRecord::new(json!({ "0": { "id": 1 } }))]);
    }

    #[tokio::test]
    async fn test_cloud_task_status_scenario() {
        let request = OperationRequest::parse("cloudExtraction", "cloudTaskStatus")
            .unwrap()
            .with_json_params(&json!({ "cloudTaskIds": [{ "value": "A" }, { "value": "B" }] }))
            .unwrap();

        let (result, requests) = run(request, json!({ "data": [] })).await;

        let req = &requests[0];
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://api.test/cloudextraction/statuses");
        assert_eq!(req.body, Some(json!({ "taskIds": ["A", "B"] })));
        assert_eq!(result.unwrap()[0].json, json!({}));
    }

    #[tokio::test]
    async fn test_empty_list_parameter_is_sent() {
        let request = OperationRequest::parse("cloudExtraction", "cloudTaskStatusV2").unwrap();
        let (_, requests) = run(request, json!({})).await;
        assert_eq!(requests[0].body, Some(json!({ "taskIds": [] })));
        assert_eq!(requests[0].url, "https://api.test/cloudextraction/statuses/v2");
    }

    #[tokio::test]
    async fn test_subtask_action_body() {
        let request = OperationRequest::parse("cloudExtraction", "cloudextractionStopSubtasks")
            .unwrap()
            .with_param("taskId", "T9")
            .with_json_params(&json!({
                "cloudSubtaskIds": { "subTaskId": [{ "value": "s1" }], "taskId": [{ "value": "X" }] }
            }))
            .unwrap();

        let (_, requests) = run(request, json!({})).await;
        assert_eq!(requests[0].url, "https://api.test/cloudextraction/subtasks{stop}");
        assert_eq!(
            requests[0].body,
            Some(json!({ "taskId": "T9", "subTaskIds": ["s1"] }))
        );
    }

    #[tokio::test]
    async fn test_query_values_are_percent_encoded() {
        let request = OperationRequest::parse("data", "getDataFromBatchByOffset")
            .unwrap()
            .with_param("taskId", "a b/c")
            .with_param("lotno", "L&1")
            .with_param("size", "50");

        let (_, requests) = run(request, json!({})).await;
        assert_eq!(
            requests[0].url,
            "https://api.test/data/lotno/all?taskId=a%20b%2Fc&lotno=L%261&offset=0&size=50"
        );
    }

    #[tokio::test]
    async fn test_defaults_applied_for_subtasks() {
        let request = OperationRequest::parse("cloudExtraction", "cloudextractionGetSubtasks")
            .unwrap()
            .with_param("taskId", "T1")
            .with_param("page", "");

        let (_, requests) = run(request, json!({})).await;
        assert_eq!(
            requests[0].url,
            "https://api.test/cloudextraction/task/subtasks?taskId=T1&page=1&size=10"
        );
    }

    #[tokio::test]
    async fn test_passthrough_for_data_by_offset() {
        let raw = json!({ "data": { "data": [1, 2], "offset": 2, "restTotal": 0 } });
        let request = OperationRequest::parse("data", "getDataByOffset")
            .unwrap()
            .with_param("taskId", "T1");

        let (result, _) = run(request, raw.clone()).await;
        assert_eq!(result.unwrap()[0].json, raw);
    }

    #[tokio::test]
    async fn test_non_exported_data_nested_indexing() {
        let request = OperationRequest::parse("data", "getNonExportedData")
            .unwrap()
            .with_param("taskId", "T1");

        let (result, requests) =
            run(request, json!({ "data": { "data": [{ "x": 1 }, { "y": 2 }] } })).await;
        assert_eq!(
            requests[0].url,
            "https://api.test/data/notexported?taskId=T1&size=100"
        );
        assert_eq!(result.unwrap()[0].json, json!({ "0": { "x": 1 }, "1": { "y": 2 } }));
    }

    #[tokio::test]
    async fn test_missing_required_parameter_fails_before_network() {
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = Dispatcher::new(transport.clone());
        let mut cache = TokenCache::new();
        let request = OperationRequest::parse("tasks", "searchTask").unwrap();

        let err = dispatcher
            .dispatch(&request, &Credentials::new("alice", "secret"), &mut cache)
            .await
            .unwrap_err();

        assert!(matches!(err, OctoparseError::MissingParameter(ref p) if p == "taskGroupId"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_multi_value_for_scalar_is_rejected() {
        let request = OperationRequest::parse("data", "removeData")
            .unwrap()
            .with_param("taskId", vec!["a", "b"]);
        let (result, requests) = run(request, json!({})).await;
        assert!(matches!(result, Err(OctoparseError::InvalidParameter { .. })));
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn test_token_fetched_once_then_reused() {
        let transport = Arc::new(
            RecordingTransport::new()
                .reply(json!({ "data": { "access_token": "FRESH" } }))
                .reply(json!({ "data": [] }))
                .reply(json!({ "data": [] })),
        );
        let dispatcher = Dispatcher::new(transport.clone());
        let credentials = Credentials::new("alice", "secret").with_base_url(BASE);
        let mut cache = TokenCache::new();
        let request = OperationRequest::parse("tasks", "getTaskGroups").unwrap();

        dispatcher.dispatch(&request, &credentials, &mut cache).await.unwrap();
        dispatcher.dispatch(&request, &credentials, &mut cache).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].url, "https://api.test/token");
        assert_eq!(requests[1].header("authorization"), Some("Bearer FRESH"));
        assert_eq!(requests[2].header("authorization"), Some("Bearer FRESH"));
    }

    #[tokio::test]
    async fn test_operation_failure_propagates_without_retry() {
        let transport = Arc::new(RecordingTransport::new().fail(401, "token expired"));
        let dispatcher = Dispatcher::new(transport.clone());
        let mut cache = TokenCache::new();
        let request = OperationRequest::parse("tasks", "getTaskGroups").unwrap();

        let err = dispatcher
            .dispatch(&request, &creds(), &mut cache)
            .await
            .unwrap_err();
        assert!(err.is_transport_error());
        assert_eq!(transport.requests().len(), 1);
    }

    fn sample_request(op: Operation) -> OperationRequest {
        let mut request = OperationRequest::new(op.resource(), op).unwrap();
        for spec in route(op).params {
            request = match spec.kind {
                ParamKind::Text => request.with_param(spec.input, format!("{}-v", spec.input)),
                ParamKind::List => request.with_param(spec.input, vec!["x", "y"]),
            };
        }
        request
    }

    #[tokio::test]
    async fn test_every_operation_issues_exactly_one_matching_call() {
        for op in Operation::ALL {
            let r = route(op);
            let (result, requests) = run(sample_request(op), json!({ "ok": true })).await;
            assert!(result.is_ok(), "{op}: {result:?}");
            assert_eq!(requests.len(), 1, "{op}");

            let req = &requests[0];
            assert_eq!(req.method, r.method, "{op}");
            let (path, query) = req.url.split_once('?').unwrap_or((req.url.as_str(), ""));
            assert_eq!(path, format!("{BASE}{}", r.path), "{op}");

            let expected_query: Vec<String> = r
                .query_params()
                .map(|p| format!("{}={}-v", p.wire, p.input))
                .collect();
            assert_eq!(query, expected_query.join("&"), "{op}");

            let body_specs: Vec<_> = r.body_params().collect();
            if body_specs.is_empty() {
                assert_eq!(req.body, None, "{op}");
            } else {
                let body = req.body.as_ref().unwrap();
                for p in body_specs {
                    let expected = match p.kind {
                        ParamKind::Text => json!(format!("{}-v", p.input)),
                        ParamKind::List => json!(["x", "y"]),
                    };
                    assert_eq!(body[p.wire], expected, "{op}: {}", p.wire);
                }
            }
        }
    }

    #[test]
    fn test_resource_catalog_is_complete() {
        let total: usize = Resource::ALL.iter().map(|r| r.operations().len()).sum();
        assert_eq!(total, Operation::ALL.len());
    }
}
