//! Helpers shared by the `call` subcommand and the REPL.

use octoparse::{route, Operation, OperationRequest, OutputRecord, ParamKind};

use crate::types::{McpError, McpResult};

/// Split `name=value`. Used as a clap value parser.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

/// Build a request from textual parameters.
///
/// `params` become scalars; `lists` values are split on commas.
pub fn build_request(
    resource: &str,
    operation: &str,
    params: &[(String, String)],
    lists: &[(String, String)],
) -> McpResult<OperationRequest> {
    let mut request = OperationRequest::parse(resource, operation)?;
    for (name, value) in params {
        request = request.with_param(name.as_str(), value.as_str());
    }
    for (name, values) in lists {
        let items: Vec<String> = values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        request = request.with_param(name.as_str(), items);
    }
    Ok(request)
}

/// Parse REPL `/call` arguments: `<resource> <operation> [name=value]... [name=a,b]...`.
///
/// Values of parameters the route declares as lists are split on commas;
/// every other value is passed through as a scalar.
pub fn parse_call_line(args: &str) -> McpResult<OperationRequest> {
    let mut words = args.split_whitespace();
    let (resource, operation) = match (words.next(), words.next()) {
        (Some(r), Some(o)) => (r, o),
        _ => {
            return Err(McpError::InvalidParams(
                "usage: /call <resource> <operation> [name=value]...".to_string(),
            ))
        }
    };

    let declared = route(operation.parse::<Operation>()?).params;
    let mut params = Vec::new();
    let mut lists = Vec::new();
    for word in words {
        let (name, value) = parse_assignment(word).map_err(McpError::InvalidParams)?;
        let is_list = declared
            .iter()
            .any(|spec| spec.input == name && spec.kind == ParamKind::List);
        if is_list {
            lists.push((name, value));
        } else {
            params.push((name, value));
        }
    }
    build_request(resource, operation, &params, &lists)
}

/// Render records the way every front end prints them.
pub fn render_records(records: &[OutputRecord]) -> String {
    serde_json::to_string_pretty(records).unwrap_or_else(|e| e.to_string())
}
