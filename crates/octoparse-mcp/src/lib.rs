//! Octoparse MCP Server: exposes the Octoparse OpenAPI to LLM clients over stdio.

pub mod cli;
pub mod config;
pub mod protocol;
pub mod repl;
pub mod resources;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::{resolve_credentials, CredentialArgs};
pub use protocol::ProtocolHandler;
pub use session::OctoparseSession;
pub use transport::StdioTransport;
