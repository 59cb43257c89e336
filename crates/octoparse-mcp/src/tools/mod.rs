//! MCP tool implementations.

pub mod auth;
pub mod cloud_extraction;
pub mod data;
mod operation;
pub mod registry;
pub mod tasks;

pub use registry::ToolRegistry;
