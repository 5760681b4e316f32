//! Data models for the PostgreSQL bridge server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod intent;
pub mod outcome;

// Re-export commonly used types
pub use connection::{
    ConnectionInfo, ConnectionStatus, ConnectionSummary, DEFAULT_CONNECT_TIMEOUT_MS,
    DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_MAX_POOL_SIZE, DEFAULT_PG_PORT, StatusReport,
};
pub use intent::{CrudIntent, FieldMap, ParamValue};
pub use outcome::QueryOutcome;
