//! Resource URI templates and static resource definitions.

use crate::types::{ResourceDefinition, ResourceTemplateDefinition, JSON_MIME};

pub const CATALOG_URI: &str = "octoparse://catalog";
pub const SESSION_URI: &str = "octoparse://session";
pub const OPERATION_PREFIX: &str = "octoparse://operation/";

pub fn list_templates() -> Vec<ResourceTemplateDefinition> {
    vec![ResourceTemplateDefinition {
        uri_template: format!("{OPERATION_PREFIX}{{resource}}/{{operation}}"),
        name: "Operation".to_string(),
        description: Some(
            "HTTP method, path, parameters, and response shape of one operation".to_string(),
        ),
        mime_type: Some(JSON_MIME.to_string()),
    }]
}

pub fn list_resources() -> Vec<ResourceDefinition> {
    vec![
        ResourceDefinition {
            uri: CATALOG_URI.to_string(),
            name: "Operation Catalog".to_string(),
            description: Some("Every operation grouped by resource".to_string()),
            mime_type: Some(JSON_MIME.to_string()),
        },
        ResourceDefinition {
            uri: SESSION_URI.to_string(),
            name: "Session".to_string(),
            description: Some("Base URL, account, token state, and call counts".to_string()),
            mime_type: Some(JSON_MIME.to_string()),
        },
    ]
}
