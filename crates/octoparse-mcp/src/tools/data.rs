//! `octoparse_data` tool. Fetch, mark, and remove extracted data.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::Value;

use octoparse::Resource;

use crate::session::OctoparseSession;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::operation;

pub const NAME: &str = "octoparse_data";

pub fn definition() -> ToolDefinition {
    operation::definition_for(
        Resource::Data,
        NAME,
        "Page through extracted data by offset or batch, fetch non-exported rows, \
         mark data as exported, or remove it",
    )
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<OctoparseSession>>,
) -> McpResult<ToolCallResult> {
    operation::execute_for(Resource::Data, args, session).await
}
