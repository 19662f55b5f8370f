//! [`Dao`] implementation answering from a [`MockQueue`].

use crate::{MockEntry, MockQueue};
use async_trait::async_trait;
use pgdao::{Dao, IsolationLevel, PgDb, QueryState, Record};
use pgdao_core::{BoxFuture, DaoResult, QueryContext};
use sqlx::postgres::PgRow;
use sqlx::FromRow;
use std::any::Any;
use tracing::debug;

/// Mock DAO for one table.
///
/// Chain methods build the same [`QueryState`] as the real DAO, so checks
/// attached to a [`MockEntry`] can assert on the exact statements.
pub struct MockDao {
    table: String,
    query: QueryState,
    queue: MockQueue,
}

impl MockDao {
    /// Creates a mock for `table` answering from `queue`.
    #[must_use]
    pub fn new(table: impl Into<String>, queue: MockQueue) -> Self {
        let table = table.into();
        Self {
            query: QueryState::new(&table),
            table,
            queue,
        }
    }

    /// Creates a mock with its own queue holding `entries`.
    #[must_use]
    pub fn with_entries(table: impl Into<String>, entries: impl IntoIterator<Item = MockEntry>) -> Self {
        Self::new(table, entries.into_iter().collect())
    }

    /// Queue shared by this handle and every handle derived from it.
    #[must_use]
    pub fn queue(&self) -> &MockQueue {
        &self.queue
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    fn derive(&self, query: QueryState) -> Self {
        Self {
            table: self.table.clone(),
            query,
            queue: self.queue.clone(),
        }
    }
}

#[async_trait]
impl Dao for MockDao {
    fn clone_session(&self) -> Self {
        debug!(table = %self.table, "Mock session cloned");
        self.derive(QueryState::new(&self.table))
    }

    fn new_query(&self) -> Self {
        self.derive(QueryState::new(&self.table))
    }

    fn count(&self) -> Self {
        self.derive(QueryState::count(&self.table))
    }

    fn query(&self) -> &QueryState {
        &self.query
    }

    fn query_mut(&mut self) -> &mut QueryState {
        &mut self.query
    }

    async fn create_ctx<R: Record>(&mut self, _ctx: &QueryContext, record: &R) -> DaoResult<i64> {
        let mut entry = self.queue.pop("create");
        let id = entry.take_entry::<i64>("create").unwrap_or_default();
        debug!(table = %self.table, id, "Mock create");
        record.columns()?;

        match entry.take_error() {
            Some(err) => Err(err),
            None => Ok(id),
        }
    }

    async fn get_ctx<T>(&mut self, _ctx: &QueryContext, dto: &mut T) -> DaoResult<bool>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static,
    {
        let mut entry = self.queue.pop("get");
        entry.check_select(self.query.select_statement());
        if let Some(value) = entry.take_entry::<T>("get") {
            *dto = value;
        }
        debug!(table = %self.table, found = entry.ok, "Mock get");

        match entry.take_error() {
            Some(err) => Err(err),
            None => Ok(entry.ok),
        }
    }

    async fn select_ctx<T>(&mut self, _ctx: &QueryContext, list: &mut Vec<T>) -> DaoResult<()>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static,
    {
        let mut entry = self.queue.pop("select");
        entry.check_select(self.query.select_statement());
        if let Some(rows) = entry.take_entry::<Vec<T>>("select") {
            *list = rows;
        }
        debug!(table = %self.table, rows = list.len(), "Mock select");

        entry.take_error().map_or(Ok(()), Err)
    }

    async fn update_ctx(&mut self, _ctx: &QueryContext) -> DaoResult<()> {
        let mut entry = self.queue.pop("update");
        entry.check_update(self.query.update_statement());
        debug!(table = %self.table, "Mock update");
        entry.take_error().map_or(Ok(()), Err)
    }

    async fn delete_ctx(&mut self, _ctx: &QueryContext) -> DaoResult<()> {
        let mut entry = self.queue.pop("delete");
        entry.check_delete(self.query.delete_statement());
        debug!(table = %self.table, "Mock delete");
        entry.take_error().map_or(Ok(()), Err)
    }

    async fn transaction_with_level<F, R>(&mut self, level: IsolationLevel, f: F) -> DaoResult<R>
    where
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, R> + Send,
        R: Send + 'static,
    {
        debug!(table = %self.table, %level, "Mock transaction started");
        let result = f(&mut *self).await;
        debug!(table = %self.table, committed = result.is_ok(), "Mock transaction finished");
        result
    }

    /// Returns the queued outcome without calling `f`: there is no
    /// session to hand it.
    async fn exec_raw_ctx<F, R>(&mut self, _ctx: &QueryContext, _f: F) -> DaoResult<R>
    where
        F: for<'a> FnOnce(&'a PgDb) -> BoxFuture<'a, R> + Send,
        R: Send + 'static,
    {
        let mut entry = self.queue.pop("exec_raw");
        debug!(table = %self.table, "Mock exec_raw");
        if let Some(err) = entry.take_error() {
            return Err(err);
        }

        match entry.take_entry::<R>("exec_raw") {
            Some(value) => Ok(value),
            None => {
                let unit: Box<dyn Any> = Box::new(());
                match unit.downcast::<R>() {
                    Ok(value) => Ok(*value),
                    Err(_) => panic!(
                        "mock entry for exec_raw needs a {} value",
                        std::any::type_name::<R>()
                    ),
                }
            }
        }
    }
}

impl std::fmt::Debug for MockDao {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDao")
            .field("table", &self.table)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}
