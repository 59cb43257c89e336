//! Static routing table: operation → HTTP request shape.

use serde::Serialize;

use crate::normalize::NormalizeMode;
use crate::types::Operation;

/// HTTP methods used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Where a parameter travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Query,
    Body,
}

/// Scalar string or list of strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Text,
    List,
}

/// One declared parameter of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    /// Name the host supplies the value under.
    pub input: &'static str,
    /// Name sent to the API.
    pub wire: &'static str,
    pub placement: Placement,
    pub kind: ParamKind,
    /// Value used when the host omits the parameter. `None` means required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
    /// Field holding the records when a list arrives as `{"<key>": [{"value": ...}]}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<&'static str>,
}

impl ParamSpec {
    pub fn is_required(&self) -> bool {
        self.kind == ParamKind::Text && self.default.is_none()
    }
}

const fn query(name: &'static str) -> ParamSpec {
    ParamSpec {
        input: name,
        wire: name,
        placement: Placement::Query,
        kind: ParamKind::Text,
        default: None,
        collection: None,
    }
}

const fn query_or(name: &'static str, default: &'static str) -> ParamSpec {
    ParamSpec {
        input: name,
        wire: name,
        placement: Placement::Query,
        kind: ParamKind::Text,
        default: Some(default),
        collection: None,
    }
}

const fn body(name: &'static str) -> ParamSpec {
    ParamSpec {
        input: name,
        wire: name,
        placement: Placement::Body,
        kind: ParamKind::Text,
        default: None,
        collection: None,
    }
}

const fn body_list(
    input: &'static str,
    wire: &'static str,
    collection: &'static str,
) -> ParamSpec {
    ParamSpec {
        input,
        wire,
        placement: Placement::Body,
        kind: ParamKind::List,
        default: None,
        collection: Some(collection),
    }
}

const NO_PARAMS: &[ParamSpec] = &[];
const TASK_IN_GROUP: &[ParamSpec] = &[query("taskGroupId"), query("taskId")];
const SEARCH_TASK: &[ParamSpec] = &[query("taskGroupId")];
const TASK_STATUSES: &[ParamSpec] = &[body_list("cloudTaskIds", "taskIds", "taskId")];
const TASK_BODY: &[ParamSpec] = &[body("taskId")];
const SUBTASK_PAGE: &[ParamSpec] = &[
    query("taskId"),
    query_or("page", "1"),
    query_or("size", "10"),
];
const SUBTASK_ACTION: &[ParamSpec] = &[
    body("taskId"),
    body_list("cloudSubtaskIds", "subTaskIds", "subTaskId"),
];
const DATA_BY_OFFSET: &[ParamSpec] = &[
    query("taskId"),
    query_or("offset", "0"),
    query_or("size", "100"),
];
const DATA_BY_BATCH: &[ParamSpec] = &[
    query("taskId"),
    query("lotno"),
    query_or("offset", "0"),
    query_or("size", "100"),
];
const DATA_NOT_EXPORTED: &[ParamSpec] = &[query("taskId"), query_or("size", "100")];

/// Request descriptor for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Route {
    pub method: HttpMethod,
    pub path: &'static str,
    pub params: &'static [ParamSpec],
    pub normalize: NormalizeMode,
}

impl Route {
    const fn new(
        method: HttpMethod,
        path: &'static str,
        params: &'static [ParamSpec],
        normalize: NormalizeMode,
    ) -> Self {
        Self {
            method,
            path,
            params,
            normalize,
        }
    }

    pub fn query_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|p| p.placement == Placement::Query)
    }

    pub fn body_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|p| p.placement == Placement::Body)
    }
}

/// Look up the request descriptor for an operation.
pub fn route(operation: Operation) -> Route {
    use HttpMethod::{Get, Post};
    use NormalizeMode::{ArrayIndexed, NestedArrayIndexed, Passthrough};

    match operation {
        Operation::GetTaskGroups => Route::new(Get, "/taskGroup", NO_PARAMS, ArrayIndexed),
        Operation::CopyTask => Route::new(Post, "/task/copy", TASK_IN_GROUP, ArrayIndexed),
        Operation::MoveTaskToGroup => {
            Route::new(Post, "/task/moveToGroup", TASK_IN_GROUP, ArrayIndexed)
        }
        Operation::SearchTask => Route::new(Get, "/task/search", SEARCH_TASK, ArrayIndexed),
        Operation::CloudTaskStatus => Route::new(
            Post,
            "/cloudextraction/statuses",
            TASK_STATUSES,
            ArrayIndexed,
        ),
        Operation::CloudTaskStatusV2 => Route::new(
            Post,
            "/cloudextraction/statuses/v2",
            TASK_STATUSES,
            ArrayIndexed,
        ),
        Operation::CloudExtractionStart => {
            Route::new(Post, "/cloudextraction/start", TASK_BODY, ArrayIndexed)
        }
        Operation::CloudExtractionStop => {
            Route::new(Post, "/cloudextraction/stop", TASK_BODY, ArrayIndexed)
        }
        Operation::CloudExtractionGetSubtasks => Route::new(
            Get,
            "/cloudextraction/task/subtasks",
            SUBTASK_PAGE,
            ArrayIndexed,
        ),
        Operation::CloudExtractionStartSubtasks => Route::new(
            Post,
            "/cloudextraction/subtasks{start}",
            SUBTASK_ACTION,
            ArrayIndexed,
        ),
        Operation::CloudExtractionStopSubtasks => Route::new(
            Post,
            "/cloudextraction/subtasks{stop}",
            SUBTASK_ACTION,
            ArrayIndexed,
        ),
        Operation::GetDataByOffset => Route::new(Get, "/data/all", DATA_BY_OFFSET, Passthrough),
        Operation::GetDataFromBatchByOffset => {
            Route::new(Get, "/data/lotno/all", DATA_BY_BATCH, Passthrough)
        }
        Operation::GetNonExportedData => Route::new(
            Get,
            "/data/notexported",
            DATA_NOT_EXPORTED,
            NestedArrayIndexed,
        ),
        Operation::MarkDataExported => {
            Route::new(Post, "/data/markexported", TASK_BODY, Passthrough)
        }
        Operation::RemoveData => Route::new(Post, "/data/remove", TASK_BODY, Passthrough),
    }
}
