//! Result type aliases for pg-dao.

use crate::DaoError;

/// A specialized `Result` type for DAO operations.
pub type DaoResult<T> = Result<T, DaoError>;

/// A boxed future returning a `DaoResult`.
///
/// Transaction and raw-execution callbacks return this so they can borrow
/// the handle they are given.
pub type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = DaoResult<T>> + Send + 'a>>;
