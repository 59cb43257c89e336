//! Session state shared by the protocol handler, CLI, and REPL.

pub mod manager;

pub use manager::{OctoparseSession, SessionStatus, TokenSource};
