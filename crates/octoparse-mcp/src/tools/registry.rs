//! Tool registration and dispatch.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::Value;

use crate::session::OctoparseSession;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::{auth, cloud_extraction, data, tasks};

pub struct ToolRegistry;

impl ToolRegistry {
    pub fn list_tools() -> Vec<ToolDefinition> {
        vec![
            tasks::definition(),
            cloud_extraction::definition(),
            data::definition(),
            auth::definition(),
        ]
    }

    pub async fn call(
        name: &str,
        arguments: Option<Value>,
        session: &Arc<Mutex<OctoparseSession>>,
    ) -> McpResult<ToolCallResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));

        match name {
            tasks::NAME => tasks::execute(args, session).await,
            cloud_extraction::NAME => cloud_extraction::execute(args, session).await,
            data::NAME => data::execute(args, session).await,
            auth::NAME => auth::execute(args, session).await,
            _ => Err(McpError::ToolNotFound(name.to_string())),
        }
    }
}
