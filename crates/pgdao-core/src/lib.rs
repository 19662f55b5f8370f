//! # pg-dao core
//!
//! Types shared by the production DAO, the mock DAO and the configuration
//! layer: the unified [`DaoError`], result aliases, per-call
//! [`QueryContext`], column references, pagination parameters and tracing
//! setup.

pub mod column;
pub mod context;
pub mod error;
pub mod pagination;
pub mod result;
pub mod telemetry;

pub use column::{column_name, column_ref, order_key};
pub use context::*;
pub use error::*;
pub use pagination::*;
pub use result::*;
pub use telemetry::TelemetryConfig;

/// Name of the primary key column every DAO table is expected to have.
pub const ID_COLUMN: &str = "id";

/// Name of the creation timestamp column used by the time filters.
pub const CREATED_AT_COLUMN: &str = "created_at";
