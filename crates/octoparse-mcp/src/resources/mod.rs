//! MCP resource implementations.

pub mod catalog;
pub mod registry;
pub mod session;
pub mod templates;

pub use registry::ResourceRegistry;
