//! Shared plumbing for the per-resource operation tools.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::{json, Map, Value};

use octoparse::{route, Operation, OperationRequest, ParamKind, Resource};

use crate::session::OctoparseSession;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

/// Build the tool definition for one resource.
///
/// The schema's `operation` enum lists the resource's operations; every
/// parameter any of them accepts is a property.
pub fn definition_for(resource: Resource, name: &str, description: &str) -> ToolDefinition {
    let operations = resource.operations();
    let mut properties = Map::new();
    properties.insert(
        "operation".to_string(),
        json!({
            "type": "string",
            "enum": operations.iter().map(Operation::as_str).collect::<Vec<_>>(),
            "description": "Operation to perform"
        }),
    );

    for op in &operations {
        for spec in route(*op).params {
            let used_by = properties
                .entry(spec.input.to_string())
                .or_insert_with(|| param_schema(spec.kind, spec.default))
                .as_object_mut()
                .and_then(|schema| schema.get_mut("x-operations"))
                .and_then(Value::as_array_mut);
            if let Some(used_by) = used_by {
                used_by.push(json!(op.as_str()));
            }
        }
    }

    ToolDefinition {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": ["operation"]
        }),
    }
}

fn param_schema(kind: ParamKind, default: Option<&str>) -> Value {
    let mut schema = match kind {
        ParamKind::Text => json!({ "type": "string" }),
        ParamKind::List => json!({
            "type": "array",
            "items": {
                "anyOf": [
                    { "type": "string" },
                    { "type": "object", "properties": { "value": { "type": "string" } } }
                ]
            }
        }),
    };
    if let Some(default) = default {
        schema["default"] = json!(default);
    }
    schema["x-operations"] = json!([]);
    schema
}

/// Parse `{operation, ...params}` and dispatch it through the session.
pub async fn execute_for(
    resource: Resource,
    args: Value,
    session: &Arc<Mutex<OctoparseSession>>,
) -> McpResult<ToolCallResult> {
    let mut fields = match args {
        Value::Object(fields) => fields,
        _ => return Err(McpError::InvalidParams("Arguments must be an object".to_string())),
    };

    let operation = match fields.remove("operation") {
        Some(Value::String(op)) => op,
        Some(_) => {
            return Err(McpError::InvalidParams(
                "'operation' must be a string".to_string(),
            ))
        }
        None => return Err(McpError::InvalidParams("'operation' is required".to_string())),
    };

    let operation: Operation = operation.parse()?;
    let request =
        OperationRequest::new(resource, operation)?.with_json_params(&Value::Object(fields))?;

    let records = session.lock().await.invoke(&request).await?;
    tracing::debug!("{resource}/{operation} returned {} record(s)", records.len());

    Ok(ToolCallResult::json(&records))
}
