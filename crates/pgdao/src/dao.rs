//! The chainable DAO interface.
//!
//! [`Dao`] is implemented by [`PgDao`](crate::PgDao) for Postgres and by
//! `pgdao_mock::MockDao` for tests. Code written against `D: Dao` runs
//! unchanged against either.
//!
//! ```text
//! dao.filter_by_id(1).filter_greater("score", 10).limit(20).get(&mut row).await?
//! ```

use crate::{PgDb, QueryState, Record};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgdao_core::{BoxFuture, CursorPageParams, DaoResult, OffsetPageParams, QueryContext};
use sea_query::Value;
use sqlx::postgres::PgRow;
use sqlx::FromRow;
use std::fmt;

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// Whatever the server default is.
    #[default]
    Default,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// Statement issued right after `BEGIN`, if any.
    #[must_use]
    pub const fn set_statement(&self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            Self::ReadUncommitted => Some("SET TRANSACTION ISOLATION LEVEL READ UNCOMMITTED"),
            Self::ReadCommitted => Some("SET TRANSACTION ISOLATION LEVEL READ COMMITTED"),
            Self::RepeatableRead => Some("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ"),
            Self::Serializable => Some("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE"),
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::ReadUncommitted => "read uncommitted",
            Self::ReadCommitted => "read committed",
            Self::RepeatableRead => "repeatable read",
            Self::Serializable => "serializable",
        };
        f.write_str(name)
    }
}

/// Data access object for a single table.
///
/// Use [`clone_session`](Dao::clone_session) to get an independent session
/// and [`new_query`](Dao::new_query) to start a new statement on the same
/// one.
#[async_trait]
pub trait Dao: Send + Sync + Sized {
    /// Independent handle: fresh builder state and its own session.
    fn clone_session(&self) -> Self;

    /// Fresh builder state on the same session.
    fn new_query(&self) -> Self;

    /// Handle on the same session whose select yields a
    /// [`RowCount`](crate::RowCount).
    fn count(&self) -> Self;

    /// Builder state accumulated so far.
    fn query(&self) -> &QueryState;

    fn query_mut(&mut self) -> &mut QueryState;

    fn filter_by_id(&mut self, id: i64) -> &mut Self {
        self.query_mut().filter_by_id(id);
        self
    }

    fn filter_greater<V: Into<Value>>(&mut self, column: &str, value: V) -> &mut Self {
        self.query_mut().filter_greater(column, value);
        self
    }

    fn filter_less<V: Into<Value>>(&mut self, column: &str, value: V) -> &mut Self {
        self.query_mut().filter_less(column, value);
        self
    }

    fn filter_by_column<V: Into<Value>>(&mut self, column: &str, value: V) -> &mut Self {
        self.query_mut().filter_by_column(column, value);
        self
    }

    fn filter_only_after(&mut self, time: DateTime<Utc>) -> &mut Self {
        self.query_mut().filter_only_after(time);
        self
    }

    fn filter_only_before(&mut self, time: DateTime<Utc>) -> &mut Self {
        self.query_mut().filter_only_before(time);
        self
    }

    fn limit(&mut self, limit: u64) -> &mut Self {
        self.query_mut().limit(limit);
        self
    }

    fn order_by_asc(&mut self, column: &str) -> &mut Self {
        self.query_mut().order_by_asc(column);
        self
    }

    fn order_by_desc(&mut self, column: &str) -> &mut Self {
        self.query_mut().order_by_desc(column);
        self
    }

    fn page(&mut self, params: &OffsetPageParams, column: &str) -> &mut Self {
        self.query_mut().page(params, column);
        self
    }

    fn cursor(&mut self, params: &CursorPageParams, column: &str) -> &mut Self {
        self.query_mut().cursor(params, column);
        self
    }

    fn update_where_id(&mut self, id: i64) -> &mut Self {
        self.query_mut().update_where_id(id);
        self
    }

    fn update_column<V: Into<Value>>(&mut self, column: &str, value: V) -> &mut Self {
        self.query_mut().update_column(column, value);
        self
    }

    fn delete_where_val<V: Into<Value>>(&mut self, column: &str, value: V) -> &mut Self {
        self.query_mut().delete_where_val(column, value);
        self
    }

    fn delete_where_id(&mut self, id: i64) -> &mut Self {
        self.query_mut().delete_where_id(id);
        self
    }

    /// Inserts `record` and returns the generated id.
    async fn create_ctx<R: Record>(&mut self, ctx: &QueryContext, record: &R) -> DaoResult<i64>;

    async fn create<R: Record>(&mut self, record: &R) -> DaoResult<i64> {
        self.create_ctx(&QueryContext::background(), record).await
    }

    /// Runs the select and writes the first row into `dto`.
    ///
    /// Returns `Ok(false)` and leaves `dto` untouched when nothing matched.
    async fn get_ctx<T>(&mut self, ctx: &QueryContext, dto: &mut T) -> DaoResult<bool>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static;

    async fn get<T>(&mut self, dto: &mut T) -> DaoResult<bool>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static,
    {
        self.get_ctx(&QueryContext::background(), dto).await
    }

    /// Runs the select and replaces the contents of `list` with every row.
    async fn select_ctx<T>(&mut self, ctx: &QueryContext, list: &mut Vec<T>) -> DaoResult<()>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static;

    async fn select<T>(&mut self, list: &mut Vec<T>) -> DaoResult<()>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static,
    {
        self.select_ctx(&QueryContext::background(), list).await
    }

    /// Runs the update; fails with `DaoError::NotFound` when no row changed.
    async fn update_ctx(&mut self, ctx: &QueryContext) -> DaoResult<()>;

    async fn update(&mut self) -> DaoResult<()> {
        self.update_ctx(&QueryContext::background()).await
    }

    /// Runs the delete. Zero affected rows is not an error.
    async fn delete_ctx(&mut self, ctx: &QueryContext) -> DaoResult<()>;

    async fn delete(&mut self) -> DaoResult<()> {
        self.delete_ctx(&QueryContext::background()).await
    }

    /// Runs `f` inside a transaction with the given isolation level.
    ///
    /// Commits when `f` returns `Ok`, rolls back otherwise.
    async fn transaction_with_level<F, R>(&mut self, level: IsolationLevel, f: F) -> DaoResult<R>
    where
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, R> + Send,
        R: Send + 'static;

    async fn transaction<F, R>(&mut self, f: F) -> DaoResult<R>
    where
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, R> + Send,
        R: Send + 'static,
    {
        self.transaction_with_level(IsolationLevel::Default, f).await
    }

    async fn transaction_serializable<F, R>(&mut self, f: F) -> DaoResult<R>
    where
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, R> + Send,
        R: Send + 'static,
    {
        self.transaction_with_level(IsolationLevel::Serializable, f).await
    }

    /// Hands the raw session to `f` for statements the builder cannot express.
    async fn exec_raw_ctx<F, R>(&mut self, ctx: &QueryContext, f: F) -> DaoResult<R>
    where
        F: for<'a> FnOnce(&'a PgDb) -> BoxFuture<'a, R> + Send,
        R: Send + 'static;

    async fn exec_raw<F, R>(&mut self, f: F) -> DaoResult<R>
    where
        F: for<'a> FnOnce(&'a PgDb) -> BoxFuture<'a, R> + Send,
        R: Send + 'static,
    {
        self.exec_raw_ctx(&QueryContext::background(), f).await
    }
}
