//! Per-call execution context for DAO operations.

use crate::{DaoError, DaoResult};
use std::future::Future;
use std::time::Duration;

/// Execution context passed to the `*_ctx` DAO operations.
///
/// The plain operations run with [`QueryContext::background`], which never
/// times out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryContext {
    timeout: Option<Duration>,
}

impl QueryContext {
    /// Context without a deadline.
    #[must_use]
    pub const fn background() -> Self {
        Self { timeout: None }
    }

    /// Context that aborts the operation after `duration`.
    #[must_use]
    pub const fn with_timeout(duration: Duration) -> Self {
        Self {
            timeout: Some(duration),
        }
    }

    /// Returns the configured timeout.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Drives `fut` to completion, honouring the deadline.
    pub async fn run<F, T>(&self, operation: &str, fut: F) -> DaoResult<T>
    where
        F: Future<Output = DaoResult<T>>,
    {
        match self.timeout {
            Some(duration) => tokio::time::timeout(duration, fut).await.map_err(|_| {
                DaoError::Timeout(format!("{} timed out after {:?}", operation, duration))
            })?,
            None => fut.await,
        }
    }
}
