//! Transport layer.
//!
//! Process-facing runners for the two front ends:
//! - Stdio: MCP protocol over standard input/output
//! - Http: the JSON API server

pub mod http;
pub mod stdio;

pub use http::HttpTransport;
pub use stdio::StdioTransport;

use crate::error::DbResult;
use std::future::Future;

/// Trait for front-end transport implementations.
pub trait Transport: Send + Sync {
    /// Start the transport and block until it is shut down.
    fn run(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Name of this transport for logging.
    fn name(&self) -> &'static str;
}
