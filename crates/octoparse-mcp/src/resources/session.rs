//! Resource: octoparse://session

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::session::OctoparseSession;
use crate::types::{McpResult, ReadResourceResult, ResourceContent};

use super::templates::SESSION_URI;

pub async fn read_session(session: &Arc<Mutex<OctoparseSession>>) -> McpResult<ReadResourceResult> {
    let status = session.lock().await.status();
    Ok(ReadResourceResult {
        contents: vec![ResourceContent::json(SESSION_URI, &status)],
    })
}
