//! Postgres implementation of [`Dao`].

use crate::db::TransactionGuard;
use crate::{Dao, IsolationLevel, PgDb, QueryState, Record};
use async_trait::async_trait;
use pgdao_core::{BoxFuture, DaoError, DaoResult, QueryContext};
use sea_query::PostgresQueryBuilder;
use sea_query_binder::SqlxBinder;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::FromRow;
use tracing::{debug, warn};

/// DAO bound to one table and one [`PgDb`] session.
pub struct PgDao {
    table: String,
    db: PgDb,
    query: QueryState,
}

impl PgDao {
    /// Creates a DAO for `table` on the given session.
    #[must_use]
    pub fn new(db: PgDb, table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            query: QueryState::new(&table),
            table,
            db,
        }
    }

    /// Creates a DAO for `table` on a fresh session of `pool`.
    #[must_use]
    pub fn from_pool(pool: PgPool, table: impl Into<String>) -> Self {
        Self::new(PgDb::new(pool), table)
    }

    /// Target table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Session this DAO executes on.
    #[must_use]
    pub fn db(&self) -> &PgDb {
        &self.db
    }
}

#[async_trait]
impl Dao for PgDao {
    fn clone_session(&self) -> Self {
        Self::new(self.db.clone_session(), self.table.clone())
    }

    fn new_query(&self) -> Self {
        Self::new(self.db.clone(), self.table.clone())
    }

    fn count(&self) -> Self {
        Self {
            table: self.table.clone(),
            db: self.db.clone(),
            query: QueryState::count(&self.table),
        }
    }

    fn query(&self) -> &QueryState {
        &self.query
    }

    fn query_mut(&mut self) -> &mut QueryState {
        &mut self.query
    }

    async fn create_ctx<R: Record>(&mut self, ctx: &QueryContext, record: &R) -> DaoResult<i64> {
        let insert = self.query.insert_statement(record.columns()?)?;
        let (sql, values) = insert.build_sqlx(PostgresQueryBuilder);
        debug!(table = %self.table, %sql, "Saving new record");

        ctx.run("create", async {
            self.db
                .fetch_scalar::<i64, _>(&sql, values)
                .await
                .map_err(DaoError::from)
        })
        .await
    }

    async fn get_ctx<T>(&mut self, ctx: &QueryContext, dto: &mut T) -> DaoResult<bool>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static,
    {
        let (sql, values) = self.query.select_statement().build_sqlx(PostgresQueryBuilder);
        debug!(table = %self.table, %sql, "Getting record");

        let row = ctx
            .run("get", async {
                self.db
                    .fetch_optional::<T, _>(&sql, values)
                    .await
                    .map_err(DaoError::from)
            })
            .await?;

        match row {
            Some(row) => {
                *dto = row;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn select_ctx<T>(&mut self, ctx: &QueryContext, list: &mut Vec<T>) -> DaoResult<()>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static,
    {
        let (sql, values) = self.query.select_statement().build_sqlx(PostgresQueryBuilder);
        debug!(table = %self.table, %sql, "Selecting records");

        *list = ctx
            .run("select", async {
                self.db
                    .fetch_all::<T, _>(&sql, values)
                    .await
                    .map_err(DaoError::from)
            })
            .await?;
        Ok(())
    }

    async fn update_ctx(&mut self, ctx: &QueryContext) -> DaoResult<()> {
        let (sql, values) = self.query.update_statement().build_sqlx(PostgresQueryBuilder);
        debug!(table = %self.table, %sql, "Updating record");

        let result = ctx
            .run("update", async {
                self.db
                    .execute(&sql, values)
                    .await
                    .map_err(|e| DaoError::query("unable to update row", e))
            })
            .await?;

        if result.rows_affected() == 0 {
            return Err(DaoError::NotFound);
        }
        Ok(())
    }

    async fn delete_ctx(&mut self, ctx: &QueryContext) -> DaoResult<()> {
        let (sql, values) = self.query.delete_statement().build_sqlx(PostgresQueryBuilder);
        debug!(table = %self.table, %sql, "Deleting record");

        ctx.run("delete", async {
            self.db
                .execute(&sql, values)
                .await
                .map_err(|e| DaoError::query("unable to delete row", e))
        })
        .await?;
        Ok(())
    }

    async fn transaction_with_level<F, R>(&mut self, level: IsolationLevel, f: F) -> DaoResult<R>
    where
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, R> + Send,
        R: Send + 'static,
    {
        self.db.begin(level).await?;
        let guard = TransactionGuard::new(&self.db);
        let result = f(&mut *self).await;
        guard.disarm();

        match result {
            Ok(value) => {
                self.db.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.db.rollback().await {
                    warn!(table = %self.table, error = %rollback_err, "Failed to roll back transaction");
                }
                Err(err)
            }
        }
    }

    async fn exec_raw_ctx<F, R>(&mut self, ctx: &QueryContext, f: F) -> DaoResult<R>
    where
        F: for<'a> FnOnce(&'a PgDb) -> BoxFuture<'a, R> + Send,
        R: Send + 'static,
    {
        debug!(table = %self.table, "Executing raw statement");
        ctx.run("exec_raw", f(&self.db)).await
    }
}

impl std::fmt::Debug for PgDao {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgDao")
            .field("table", &self.table)
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}
