//! Core data types for credentials, operation requests, and output records.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::route;

/// Base URL used when credentials do not name one.
pub const DEFAULT_BASE_URL: &str = "https://openapi.octoparse.com";

/// Account credentials for the Octoparse OpenAPI.
///
/// Owned by the caller and passed by reference into every dispatch.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Pre-resolved bearer token. When non-empty the token endpoint is never called.
    #[serde(default, rename = "access_token")]
    pub access_token: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            base_url: None,
            username: username.into(),
            password: password.into(),
            access_token: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Effective base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    /// The caller-supplied token, if any.
    pub fn preset_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("access_token", &self.preset_token().map(|_| "<redacted>"))
            .finish()
    }
}

/// Opaque bearer token issued by the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// API resource groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    #[serde(rename = "tasks")]
    Tasks,
    #[serde(rename = "cloudExtraction")]
    CloudExtraction,
    #[serde(rename = "data")]
    Data,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Tasks, Resource::CloudExtraction, Resource::Data];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Tasks => "tasks",
            Resource::CloudExtraction => "cloudExtraction",
            Resource::Data => "data",
        }
    }

    /// Operations available on this resource, in catalog order.
    pub fn operations(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| op.resource() == *self)
            .collect()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = OctoparseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| OctoparseError::UnknownResource(s.to_string()))
    }
}

/// Every operation the client can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    GetTaskGroups,
    CopyTask,
    MoveTaskToGroup,
    SearchTask,
    CloudTaskStatus,
    CloudTaskStatusV2,
    #[serde(rename = "cloudextractionStart")]
    CloudExtractionStart,
    #[serde(rename = "cloudextractionStop")]
    CloudExtractionStop,
    #[serde(rename = "cloudextractionGetSubtasks")]
    CloudExtractionGetSubtasks,
    #[serde(rename = "cloudextractionStartSubtasks")]
    CloudExtractionStartSubtasks,
    #[serde(rename = "cloudextractionStopSubtasks")]
    CloudExtractionStopSubtasks,
    GetDataByOffset,
    GetDataFromBatchByOffset,
    GetNonExportedData,
    MarkDataExported,
    RemoveData,
}

impl Operation {
    pub const ALL: [Operation; 16] = [
        Operation::GetTaskGroups,
        Operation::CopyTask,
        Operation::MoveTaskToGroup,
        Operation::SearchTask,
        Operation::CloudTaskStatus,
        Operation::CloudTaskStatusV2,
        Operation::CloudExtractionStart,
        Operation::CloudExtractionStop,
        Operation::CloudExtractionGetSubtasks,
        Operation::CloudExtractionStartSubtasks,
        Operation::CloudExtractionStopSubtasks,
        Operation::GetDataByOffset,
        Operation::GetDataFromBatchByOffset,
        Operation::GetNonExportedData,
        Operation::MarkDataExported,
        Operation::RemoveData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetTaskGroups => "getTaskGroups",
            Operation::CopyTask => "copyTask",
            Operation::MoveTaskToGroup => "moveTaskToGroup",
            Operation::SearchTask => "searchTask",
            Operation::CloudTaskStatus => "cloudTaskStatus",
            Operation::CloudTaskStatusV2 => "cloudTaskStatusV2",
            Operation::CloudExtractionStart => "cloudextractionStart",
            Operation::CloudExtractionStop => "cloudextractionStop",
            Operation::CloudExtractionGetSubtasks => "cloudextractionGetSubtasks",
            Operation::CloudExtractionStartSubtasks => "cloudextractionStartSubtasks",
            Operation::CloudExtractionStopSubtasks => "cloudextractionStopSubtasks",
            Operation::GetDataByOffset => "getDataByOffset",
            Operation::GetDataFromBatchByOffset => "getDataFromBatchByOffset",
            Operation::GetNonExportedData => "getNonExportedData",
            Operation::MarkDataExported => "markDataExported",
            Operation::RemoveData => "removeData",
        }
    }

    /// The resource group this operation belongs to.
    pub fn resource(&self) -> Resource {
        match self {
            Operation::GetTaskGroups
            | Operation::CopyTask
            | Operation::MoveTaskToGroup
            | Operation::SearchTask => Resource::Tasks,
            Operation::CloudTaskStatus
            | Operation::CloudTaskStatusV2
            | Operation::CloudExtractionStart
            | Operation::CloudExtractionStop
            | Operation::CloudExtractionGetSubtasks
            | Operation::CloudExtractionStartSubtasks
            | Operation::CloudExtractionStopSubtasks => Resource::CloudExtraction,
            Operation::GetDataByOffset
            | Operation::GetDataFromBatchByOffset
            | Operation::GetNonExportedData
            | Operation::MarkDataExported
            | Operation::RemoveData => Resource::Data,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = OctoparseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| OctoparseError::UnknownOperation(s.to_string()))
    }
}

/// A single operation parameter: a scalar string or an ordered list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    List(Vec<String>),
}

impl ParamValue {
    /// Convert a loosely-typed JSON argument into a parameter value.
    ///
    /// Arrays are plucked record by record. An object is either a single
    /// `{"value": ...}` record or, when `collection` names a field, the
    /// fixed-collection shape holding the records under that field.
    /// Returns `None` for `null`.
    pub fn from_json(
        name: &str,
        value: &Value,
        collection: Option<&str>,
    ) -> OctoparseResult<Option<Self>> {
        let param = match value {
            Value::Null => return Ok(None),
            Value::String(s) => ParamValue::Text(s.clone()),
            Value::Number(n) => ParamValue::Text(n.to_string()),
            Value::Bool(b) => ParamValue::Text(b.to_string()),
            Value::Array(_) => ParamValue::List(pluck_values(value, collection)),
            Value::Object(fields) => match (fields.get("value"), collection) {
                (Some(inner), _) => match scalar_value(inner) {
                    Some(text) => ParamValue::Text(text),
                    None => return Err(invalid_shape(name)),
                },
                (None, Some(_)) => ParamValue::List(pluck_values(value, collection)),
                (None, None) => return Err(invalid_shape(name)),
            },
        };
        Ok(Some(param))
    }
}

fn invalid_shape(name: &str) -> OctoparseError {
    OctoparseError::InvalidParameter {
        name: name.to_string(),
        reason: "expected a string or an object with a `value` field".to_string(),
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(items: Vec<String>) -> Self {
        ParamValue::List(items)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(items: Vec<&str>) -> Self {
        ParamValue::List(items.into_iter().map(str::to_string).collect())
    }
}

/// Pluck the `value` field from a collection of records.
///
/// Accepts `[{"value": "A"}, ...]`, plain string arrays, a lone
/// `{"value": "A"}` record, and the fixed-collection shape
/// `{"<collection>": [{"value": "A"}, ...]}`. Other fields are ignored.
pub fn pluck_values(records: &Value, collection: Option<&str>) -> Vec<String> {
    match records {
        Value::Array(items) => items.iter().filter_map(scalar_value).collect(),
        Value::Object(fields) => {
            if let Some(value) = fields.get("value") {
                return scalar_value(value).into_iter().collect();
            }
            match collection.and_then(|key| fields.get(key)) {
                Some(Value::Array(items)) => items.iter().filter_map(scalar_value).collect(),
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

fn scalar_value(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(record) => record.get("value").and_then(scalar_value),
        _ => None,
    }
}

/// A fully-resolved request for one catalog operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    resource: Resource,
    operation: Operation,
    parameters: BTreeMap<String, ParamValue>,
}

impl OperationRequest {
    /// Build a request, checking that the operation belongs to the resource.
    pub fn new(resource: Resource, operation: Operation) -> OctoparseResult<Self> {
        if operation.resource() != resource {
            return Err(OctoparseError::OperationMismatch {
                resource: resource.to_string(),
                operation: operation.to_string(),
            });
        }
        Ok(Self {
            resource,
            operation,
            parameters: BTreeMap::new(),
        })
    }

    /// Build a request from host-supplied selector strings.
    pub fn parse(resource: &str, operation: &str) -> OctoparseResult<Self> {
        let resource: Resource = resource.parse()?;
        let operation: Operation = operation.parse()?;
        Self::new(resource, operation)
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Merge every field of a JSON object as a parameter. Non-objects are ignored.
    ///
    /// Declared parameters are read in the shape the route expects; a
    /// malformed one is an `InvalidParameter`. Undeclared fields are kept
    /// when they convert cleanly and skipped otherwise.
    pub fn with_json_params(mut self, args: &Value) -> OctoparseResult<Self> {
        let Value::Object(fields) = args else {
            return Ok(self);
        };
        let declared = route(self.operation).params;
        for (name, value) in fields {
            let spec = declared.iter().find(|spec| spec.input == name.as_str());
            match ParamValue::from_json(name, value, spec.and_then(|spec| spec.collection)) {
                Ok(Some(param)) => {
                    self.parameters.insert(name.clone(), param);
                }
                Ok(None) => {}
                Err(err) if spec.is_some() => return Err(err),
                Err(_) => {}
            }
        }
        Ok(self)
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    pub fn parameters(&self) -> &BTreeMap<String, ParamValue> {
        &self.parameters
    }
}

/// One item of dispatch output, shaped as `{"json": …}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub json: Value,
}

impl OutputRecord {
    pub fn new(json: Value) -> Self {
        Self { json }
    }
}

/// Errors that can occur in the Octoparse client.
#[derive(thiserror::Error, Debug)]
pub enum OctoparseError {
    #[error("Could not obtain access token from Octoparse API: {0}")]
    Auth(String),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Operation {operation} is not available for resource {resource}")]
    OperationMismatch { resource: String, operation: String },

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl OctoparseError {
    /// Token endpoint reachable but no token could be obtained.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, OctoparseError::Auth(_) | OctoparseError::MissingCredential(_))
    }

    /// Network or HTTP-level failure on either call.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            OctoparseError::Http(_) | OctoparseError::Status { .. } | OctoparseError::Transport(_)
        )
    }

    /// Resource/operation selection not recognized.
    pub fn is_operation_error(&self) -> bool {
        matches!(
            self,
            OctoparseError::UnknownResource(_)
                | OctoparseError::UnknownOperation(_)
                | OctoparseError::OperationMismatch { .. }
        )
    }
}

/// Convenience result type.
pub type OctoparseResult<T> = Result<T, OctoparseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_url_defaults_when_absent_or_empty() {
        let creds = Credentials::new("user", "pass");
        assert_eq!(creds.base_url(), DEFAULT_BASE_URL);

        let creds = Credentials::new("user", "pass").with_base_url("");
        assert_eq!(creds.base_url(), DEFAULT_BASE_URL);

        let creds = Credentials::new("user", "pass").with_base_url("http://localhost:9000/");
        assert_eq!(creds.base_url(), "http://localhost:9000");
    }

    #[test]
    fn test_credentials_deserialize_host_shape() {
        let creds: Credentials = serde_json::from_value(json!({
            "baseUrl": "https://example.test",
            "username": "alice@example.test",
            "password": "secret",
            "access_token": "tok"
        }))
        .unwrap();
        assert_eq!(creds.base_url(), "https://example.test");
        assert_eq!(creds.preset_token(), Some("tok"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new("alice", "hunter2").with_access_token("sekrit");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("sekrit"));
        assert!(rendered.contains("alice"));

        let token = AccessToken::new("sekrit");
        assert!(!format!("{token:?}").contains("sekrit"));
        assert_eq!(token.bearer(), "Bearer sekrit");
    }

    #[test]
    fn test_every_operation_parses_back() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
            let serialized = serde_json::to_value(op).unwrap();
            assert_eq!(serialized, json!(op.as_str()));
        }
        for resource in Resource::ALL {
            assert_eq!(resource.as_str().parse::<Resource>().unwrap(), resource);
        }
    }

    #[test]
    fn test_resource_operation_counts() {
        assert_eq!(Resource::Tasks.operations().len(), 4);
        assert_eq!(Resource::CloudExtraction.operations().len(), 7);
        assert_eq!(Resource::Data.operations().len(), 5);
    }

    #[test]
    fn test_unknown_resource_is_operation_error() {
        let err = OperationRequest::parse("foo", "getTaskGroups").unwrap_err();
        assert!(matches!(err, OctoparseError::UnknownResource(ref r) if r == "foo"));
        assert!(err.is_operation_error());
    }

    #[test]
    fn test_operation_must_match_resource() {
        let err = OperationRequest::parse("data", "copyTask").unwrap_err();
        assert!(matches!(err, OctoparseError::OperationMismatch { .. }));
        assert!(err.is_operation_error());
    }

    #[test]
    fn test_pluck_values_shapes() {
        assert_eq!(
            pluck_values(&json!([{ "value": "A" }, { "value": "B" }]), None),
            vec!["A", "B"]
        );
        assert_eq!(
            pluck_values(&json!({ "taskId": [{ "value": "A" }, { "value": "B" }] }), Some("taskId")),
            vec!["A", "B"]
        );
        assert_eq!(pluck_values(&json!(["x", 7]), None), vec!["x", "7"]);
        assert!(pluck_values(&json!({}), Some("taskId")).is_empty());
        assert!(pluck_values(&json!([]), None).is_empty());
    }

    #[test]
    fn test_pluck_values_reads_only_named_collection() {
        let records = json!({
            "subTaskId": [{ "value": "s1" }],
            "taskId": [{ "value": "X" }],
        });
        assert_eq!(pluck_values(&records, Some("subTaskId")), vec!["s1"]);
        assert_eq!(pluck_values(&records, Some("taskId")), vec!["X"]);
        assert!(pluck_values(&records, None).is_empty());
    }

    #[test]
    fn test_json_params_use_declared_collection() {
        let request = OperationRequest::parse("cloudExtraction", "cloudextractionStartSubtasks")
            .unwrap()
            .with_json_params(&json!({
                "taskId": "T1",
                "cloudSubtaskIds": {
                    "subTaskId": [{ "value": "s1" }],
                    "taskId": [{ "value": "X" }],
                },
            }))
            .unwrap();
        assert_eq!(request.param("cloudSubtaskIds"), Some(&ParamValue::from(vec!["s1"])));
    }

    #[test]
    fn test_json_params_skip_null() {
        let request = OperationRequest::parse("tasks", "copyTask")
            .unwrap()
            .with_json_params(&json!({ "taskGroupId": "G1", "taskId": null, "page": 2 }))
            .unwrap();
        assert_eq!(request.param("taskGroupId"), Some(&ParamValue::from("G1")));
        assert_eq!(request.param("taskId"), None);
        assert_eq!(request.param("page"), Some(&ParamValue::from("2")));
    }

    #[test]
    fn test_json_params_value_record_is_scalar() {
        let request = OperationRequest::parse("data", "removeData")
            .unwrap()
            .with_json_params(&json!({ "taskId": { "value": "T1" } }))
            .unwrap();
        assert_eq!(request.param("taskId"), Some(&ParamValue::from("T1")));
    }

    #[test]
    fn test_json_params_reject_object_without_value() {
        let err = OperationRequest::parse("data", "removeData")
            .unwrap()
            .with_json_params(&json!({ "taskId": { "foo": "bar" } }))
            .unwrap_err();
        assert!(matches!(err, OctoparseError::InvalidParameter { ref name, .. } if name == "taskId"));

        let request = OperationRequest::parse("data", "removeData")
            .unwrap()
            .with_json_params(&json!({ "taskId": "T1", "extra": { "foo": "bar" } }))
            .unwrap();
        assert_eq!(request.param("extra"), None);
    }
}
