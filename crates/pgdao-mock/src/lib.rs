//! # pg-dao mock
//!
//! A [`Dao`](pgdao::Dao) implementation without a database, for unit
//! testing code written against `D: Dao`.
//!
//! Every executing operation (`create`, `get`, `select`, `update`,
//! `delete`, `exec_raw`) consumes the next [`MockEntry`] from a shared
//! [`MockQueue`], strictly in the order the test enqueued them. Handles
//! derived with `clone_session`, `new_query` or `count` share the queue.
//! Running out of entries panics and fails the test.

mod mock_dao;
mod mock_entry;
mod queue;

pub use mock_dao::MockDao;
pub use mock_entry::{DeleteCheck, MockEntry, SelectCheck, UpdateCheck};
pub use queue::MockQueue;

use sea_query::{PostgresQueryBuilder, QueryStatementWriter};

/// Renders a statement with inlined values, for assertions in checks.
#[must_use]
pub fn render<S: QueryStatementWriter>(statement: &S) -> String {
    statement.to_string(PostgresQueryBuilder)
}
