//! Error types and JSON-RPC error codes for the MCP server.

use serde_json::json;

use octoparse::OctoparseError;

use super::message::{JsonRpcError, JsonRpcErrorObject, RequestId, JSONRPC_VERSION};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// MCP-specific error codes.
pub mod mcp_error_codes {
    pub const RESOURCE_NOT_FOUND: i32 = -32802;
    pub const TOOL_NOT_FOUND: i32 = -32803;

    /// Token could not be obtained, or credentials are incomplete.
    pub const AUTH_ERROR: i32 = -32850;
    /// Unknown resource/operation selection.
    pub const OPERATION_ERROR: i32 = -32851;
    /// The Octoparse API call failed at the network or HTTP level.
    pub const UPSTREAM_ERROR: i32 = -32852;
}

/// All errors that can occur in the MCP server.
#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unsupported operation: {0}")]
    Operation(String),

    /// Upstream failure; `status` is set when the API answered with a non-2xx code.
    #[error("Octoparse API error: {message}")]
    Upstream { status: Option<u16>, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;
        match self {
            McpError::ParseError(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::InternalError(_) => INTERNAL_ERROR,
            McpError::ResourceNotFound(_) => RESOURCE_NOT_FOUND,
            McpError::ToolNotFound(_) => TOOL_NOT_FOUND,
            McpError::Auth(_) => AUTH_ERROR,
            McpError::Operation(_) => OPERATION_ERROR,
            McpError::Upstream { .. } => UPSTREAM_ERROR,
            McpError::Io(_) => INTERNAL_ERROR,
            McpError::Json(_) => PARSE_ERROR,
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        let data = match self {
            McpError::Upstream {
                status: Some(status),
                ..
            } => Some(json!({ "status": status })),
            _ => None,
        };

        JsonRpcError {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorObject {
                code: self.code(),
                message: self.to_string(),
                data,
            },
        }
    }
}

impl From<OctoparseError> for McpError {
    fn from(e: OctoparseError) -> Self {
        match e {
            OctoparseError::Status { status, .. } => McpError::Upstream {
                status: Some(status),
                message: e.to_string(),
            },
            e if e.is_auth_error() => McpError::Auth(e.to_string()),
            e if e.is_operation_error() => McpError::Operation(e.to_string()),
            e if e.is_transport_error() => McpError::Upstream {
                status: None,
                message: e.to_string(),
            },
            e => McpError::InvalidParams(e.to_string()),
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_errors_map_to_codes() {
        let auth: McpError = OctoparseError::Auth("nope".into()).into();
        assert_eq!(auth.code(), mcp_error_codes::AUTH_ERROR);

        let missing: McpError = OctoparseError::MissingCredential("password").into();
        assert_eq!(missing.code(), mcp_error_codes::AUTH_ERROR);

        let op: McpError = OctoparseError::UnknownOperation("frobnicate".into()).into();
        assert_eq!(op.code(), mcp_error_codes::OPERATION_ERROR);

        let param: McpError = OctoparseError::MissingParameter("taskId".into()).into();
        assert_eq!(param.code(), error_codes::INVALID_PARAMS);

        let upstream: McpError = OctoparseError::Status {
            status: 500,
            body: "boom".into(),
        }
        .into();
        assert_eq!(upstream.code(), mcp_error_codes::UPSTREAM_ERROR);
    }

    #[test]
    fn test_upstream_status_is_attached_as_data() {
        let err: McpError = OctoparseError::Status {
            status: 429,
            body: "slow down".into(),
        }
        .into();
        let rpc = err.to_json_rpc_error(RequestId::Number(7));
        assert_eq!(rpc.error.data, Some(json!({ "status": 429 })));
        assert!(rpc.error.message.contains("429"));
    }
}
