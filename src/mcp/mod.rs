//! MCP front end.
//!
//! Translates MCP tool calls into the shared core contracts using the rmcp
//! framework.

pub mod service;

pub use service::PgService;
