//! # pg-dao
//!
//! Chainable data access objects for Postgres.
//!
//! ```text
//! Caller (generic over D: Dao)
//!   ↓
//! PgDao ── QueryState (select / update / delete under construction)
//!   ↓
//! PgDb  ── pool + optional open transaction
//!   ↓
//! Postgres
//! ```
//!
//! ## Structure
//!
//! ```text
//! src/
//!   dao.rs      ← Dao trait, IsolationLevel
//!   query.rs    ← QueryState, RowCount
//!   record.rs   ← Record trait, serde based column mapping
//!   db.rs       ← PgDb session handle
//!   pg_dao.rs   ← PgDao
//!   pool.rs     ← DatabasePool (pool from configuration)
//! ```
//!
//! Tests swap [`PgDao`] for `pgdao_mock::MockDao`, which implements the
//! same [`Dao`] trait.

pub mod dao;
pub mod db;
pub mod pg_dao;
pub mod pool;
pub mod query;
pub mod record;

pub use dao::{Dao, IsolationLevel};
pub use db::PgDb;
pub use pg_dao::PgDao;
pub use pool::*;
pub use query::{QueryState, RowCount};
pub use record::{to_columns, Casted, Record, Serialized};

pub use pgdao_core::{
    BoxFuture, CursorPageParams, DaoError, DaoResult, OffsetPageParams, QueryContext, SortOrder,
    CREATED_AT_COLUMN, ID_COLUMN,
};
