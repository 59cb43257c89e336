//! `octoparse_tasks` tool. Task groups, copy, move, and search.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::Value;

use octoparse::Resource;

use crate::session::OctoparseSession;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::operation;

pub const NAME: &str = "octoparse_tasks";

pub fn definition() -> ToolDefinition {
    operation::definition_for(
        Resource::Tasks,
        NAME,
        "List task groups, search tasks in a group, copy a task, or move it to another group",
    )
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<OctoparseSession>>,
) -> McpResult<ToolCallResult> {
    operation::execute_for(Resource::Tasks, args, session).await
}
