//! Database session handle.

use crate::IsolationLevel;
use pgdao_core::{DaoError, DaoResult};
use sqlx::postgres::{PgPool, PgQueryResult, PgRow};
use sqlx::{FromRow, IntoArguments, Postgres, Transaction};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A database session: a pool plus at most one open transaction.
///
/// Cloning with `Clone` shares the session, so statements issued through
/// any copy run inside the same transaction. [`PgDb::clone_session`]
/// starts an independent session on the same pool.
#[derive(Clone)]
pub struct PgDb {
    pool: PgPool,
    tx: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl PgDb {
    /// Creates a session on `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            tx: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Independent session on the same pool, without the open transaction.
    #[must_use]
    pub fn clone_session(&self) -> Self {
        Self::new(self.pool.clone())
    }

    /// Checks whether both handles belong to the same session.
    #[must_use]
    pub fn same_session(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tx, &other.tx)
    }

    /// Checks whether a transaction is open on this session.
    pub async fn in_transaction(&self) -> bool {
        self.tx.lock().await.is_some()
    }

    /// Opens a transaction on this session.
    pub async fn begin(&self, level: IsolationLevel) -> DaoResult<()> {
        let mut slot = self.tx.lock().await;
        if slot.is_some() {
            return Err(DaoError::transaction("transaction already in progress"));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DaoError::query("unable to begin transaction", e))?;
        if let Some(statement) = level.set_statement() {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| DaoError::query("unable to set isolation level", e))?;
        }

        debug!(%level, "Transaction started");
        *slot = Some(tx);
        Ok(())
    }

    /// Commits the open transaction.
    pub async fn commit(&self) -> DaoResult<()> {
        let tx = self.take_transaction().await?;
        tx.commit()
            .await
            .map_err(|e| DaoError::query("unable to commit transaction", e))?;
        debug!("Transaction committed");
        Ok(())
    }

    /// Rolls back the open transaction.
    pub async fn rollback(&self) -> DaoResult<()> {
        let tx = self.take_transaction().await?;
        tx.rollback()
            .await
            .map_err(|e| DaoError::query("unable to rollback transaction", e))?;
        debug!("Transaction rolled back");
        Ok(())
    }

    async fn take_transaction(&self) -> DaoResult<Transaction<'static, Postgres>> {
        self.tx
            .lock()
            .await
            .take()
            .ok_or_else(|| DaoError::transaction("no transaction in progress"))
    }

    /// Drops the open transaction, if any, without waiting for it.
    ///
    /// sqlx rolls a dropped transaction back when the connection goes back
    /// to the pool.
    fn discard_transaction(&self) {
        match self.tx.try_lock() {
            Ok(mut slot) => {
                if slot.take().is_some() {
                    warn!("Abandoned transaction discarded");
                }
            }
            Err(_) => match Handle::try_current() {
                Ok(handle) => {
                    let tx = Arc::clone(&self.tx);
                    handle.spawn(async move {
                        if tx.lock().await.take().is_some() {
                            warn!("Abandoned transaction discarded");
                        }
                    });
                }
                Err(_) => warn!("No runtime to discard abandoned transaction"),
            },
        }
    }

    /// Executes a statement and returns the driver result.
    pub async fn execute<'q, A>(&self, sql: &'q str, args: A) -> Result<PgQueryResult, sqlx::Error>
    where
        A: IntoArguments<'q, Postgres> + Send + 'q,
    {
        let query = sqlx::query_with(sql, args);
        let mut slot = self.tx.lock().await;
        if let Some(tx) = slot.as_mut() {
            return query.execute(&mut **tx).await;
        }
        drop(slot);
        query.execute(&self.pool).await
    }

    /// Fetches at most one row.
    pub async fn fetch_optional<'q, T, A>(&self, sql: &'q str, args: A) -> Result<Option<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        A: IntoArguments<'q, Postgres> + Send + 'q,
    {
        let query = sqlx::query_as_with::<_, T, _>(sql, args);
        let mut slot = self.tx.lock().await;
        if let Some(tx) = slot.as_mut() {
            return query.fetch_optional(&mut **tx).await;
        }
        drop(slot);
        query.fetch_optional(&self.pool).await
    }

    /// Fetches every row.
    pub async fn fetch_all<'q, T, A>(&self, sql: &'q str, args: A) -> Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        A: IntoArguments<'q, Postgres> + Send + 'q,
    {
        let query = sqlx::query_as_with::<_, T, _>(sql, args);
        let mut slot = self.tx.lock().await;
        if let Some(tx) = slot.as_mut() {
            return query.fetch_all(&mut **tx).await;
        }
        drop(slot);
        query.fetch_all(&self.pool).await
    }

    /// Fetches the first column of exactly one row.
    pub async fn fetch_scalar<'q, T, A>(&self, sql: &'q str, args: A) -> Result<T, sqlx::Error>
    where
        T: sqlx::Type<Postgres> + for<'r> sqlx::Decode<'r, Postgres> + Send + Unpin,
        A: IntoArguments<'q, Postgres> + Send + 'q,
    {
        let query = sqlx::query_scalar_with::<_, T, _>(sql, args);
        let mut slot = self.tx.lock().await;
        if let Some(tx) = slot.as_mut() {
            return query.fetch_one(&mut **tx).await;
        }
        drop(slot);
        query.fetch_one(&self.pool).await
    }
}

/// Discards the session's transaction when dropped before being disarmed.
///
/// Held across the body of a transaction so a cancelled caller does not
/// leave the transaction parked on the session.
pub(crate) struct TransactionGuard {
    db: Option<PgDb>,
}

impl TransactionGuard {
    pub(crate) fn new(db: &PgDb) -> Self {
        Self {
            db: Some(db.clone()),
        }
    }

    /// The body finished; commit or rollback is up to the caller.
    pub(crate) fn disarm(mut self) {
        self.db = None;
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        if let Some(db) = self.db.take() {
            db.discard_transaction();
        }
    }
}

impl std::fmt::Debug for PgDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgDb")
            .field("size", &self.pool.size())
            .field("num_idle", &self.pool.num_idle())
            .finish_non_exhaustive()
    }
}
