//! Database core.
//!
//! The shared layer both front ends resolve to:
//! - Pool lifecycle management with hot reconfiguration
//! - CRUD statement building with positional placeholders
//! - Query execution with uniform outcomes
//! - Type decoding and schema probes

pub mod executor;
pub mod manager;
pub mod schema;
pub mod statement;
pub mod types;

pub use executor::{dispatch, execute};
pub use manager::{PoolHandle, PoolManager};
pub use schema::ColumnInfo;
pub use statement::Statement;
