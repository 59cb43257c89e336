//! `octoparse_auth` tool. Inspect, acquire, or clear the access token.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::session::OctoparseSession;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

pub const NAME: &str = "octoparse_auth";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum AuthAction {
    Status,
    Acquire,
    Clear,
}

#[derive(Debug, Deserialize)]
struct AuthParams {
    #[serde(default = "default_action")]
    action: AuthAction,
    /// Discard any cached token before acquiring.
    #[serde(default)]
    force: bool,
}

fn default_action() -> AuthAction {
    AuthAction::Status
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: Some(
            "Show token status, fetch a token with the configured credentials, \
             or clear the cached token so the next call re-authenticates"
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["status", "acquire", "clear"],
                    "default": "status"
                },
                "force": {
                    "type": "boolean",
                    "default": false,
                    "description": "With 'acquire', discard the cached token first"
                }
            }
        }),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<OctoparseSession>>,
) -> McpResult<ToolCallResult> {
    let params: AuthParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let mut session = session.lock().await;
    match params.action {
        AuthAction::Status => Ok(ToolCallResult::json(&session.status())),
        AuthAction::Acquire => {
            let status = session.acquire_token(params.force).await?;
            Ok(ToolCallResult::json(&status))
        }
        AuthAction::Clear => {
            let cleared = session.clear_token();
            Ok(ToolCallResult::json(&json!({
                "cleared": cleared,
                "status": session.status(),
            })))
        }
    }
}
