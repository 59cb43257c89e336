//! Resource registration and dispatch.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::session::OctoparseSession;
use crate::types::{
    McpError, McpResult, ReadResourceResult, ResourceDefinition, ResourceTemplateDefinition,
};

use super::templates::{CATALOG_URI, OPERATION_PREFIX, SESSION_URI};
use super::{catalog, session, templates};

pub struct ResourceRegistry;

impl ResourceRegistry {
    pub fn list_templates() -> Vec<ResourceTemplateDefinition> {
        templates::list_templates()
    }

    pub fn list_resources() -> Vec<ResourceDefinition> {
        templates::list_resources()
    }

    pub async fn read(
        uri: &str,
        session: &Arc<Mutex<OctoparseSession>>,
    ) -> McpResult<ReadResourceResult> {
        if uri == CATALOG_URI {
            catalog::read_catalog()
        } else if uri == SESSION_URI {
            session::read_session(session).await
        } else if let Some(rest) = uri.strip_prefix(OPERATION_PREFIX) {
            let (resource, operation) = rest.split_once('/').ok_or_else(|| {
                McpError::InvalidParams(
                    "Operation URI must be octoparse://operation/{resource}/{operation}"
                        .to_string(),
                )
            })?;
            catalog::read_operation(resource, operation)
        } else {
            Err(McpError::ResourceNotFound(uri.to_string()))
        }
    }
}
