//! Resources: octoparse://catalog and octoparse://operation/{resource}/{operation}

use serde_json::{json, Value};

use octoparse::{route, Operation, OperationRequest, Resource};

use crate::types::{McpResult, ReadResourceResult, ResourceContent};

use super::templates::{CATALOG_URI, OPERATION_PREFIX};

fn describe(operation: Operation) -> Value {
    json!({
        "resource": operation.resource(),
        "operation": operation,
        "route": route(operation),
    })
}

pub fn read_catalog() -> McpResult<ReadResourceResult> {
    let resources: Vec<Value> = Resource::ALL
        .iter()
        .map(|resource| {
            json!({
                "resource": resource,
                "operations": resource
                    .operations()
                    .into_iter()
                    .map(describe)
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    let content = json!({
        "operation_count": Operation::ALL.len(),
        "resources": resources,
    });

    Ok(ReadResourceResult {
        contents: vec![ResourceContent::json(CATALOG_URI, &content)],
    })
}

pub fn read_operation(resource: &str, operation: &str) -> McpResult<ReadResourceResult> {
    let request = OperationRequest::parse(resource, operation)?;
    let uri = format!("{OPERATION_PREFIX}{resource}/{operation}");
    Ok(ReadResourceResult {
        contents: vec![ResourceContent::json(uri, &describe(request.operation()))],
    })
}
