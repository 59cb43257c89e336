//! `octoparse_cloud_extraction` tool. Start, stop, and inspect cloud runs.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::Value;

use octoparse::Resource;

use crate::session::OctoparseSession;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::operation;

pub const NAME: &str = "octoparse_cloud_extraction";

pub fn definition() -> ToolDefinition {
    operation::definition_for(
        Resource::CloudExtraction,
        NAME,
        "Start or stop cloud extraction for a task or its subtasks, and query run status",
    )
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<OctoparseSession>>,
) -> McpResult<ToolCallResult> {
    operation::execute_for(Resource::CloudExtraction, args, session).await
}
