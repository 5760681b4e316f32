//! PostgreSQL Bridge Server Library
//!
//! Exposes one PostgreSQL database through two parallel front ends - a JSON
//! HTTP API and an MCP tool server - both resolving to the same
//! connection-pool-backed core: pool lifecycle with hot reconfiguration,
//! a parameterized CRUD statement builder, and uniform query outcomes.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod mcp;
pub mod models;
pub mod store;
pub mod transport;

pub use config::Config;
pub use db::PoolManager;
pub use error::{DbError, DbResult};
pub use mcp::PgService;
