//! Canned outcomes consumed by [`MockDao`](crate::MockDao).

use pgdao_core::DaoError;
use sea_query::{DeleteStatement, SelectStatement, UpdateStatement};
use std::any::Any;
use std::fmt;

/// Assertion run against the select statement at call time.
pub type SelectCheck = Box<dyn FnOnce(&SelectStatement) + Send>;
/// Assertion run against the update statement at call time.
pub type UpdateCheck = Box<dyn FnOnce(&UpdateStatement) + Send>;
/// Assertion run against the delete statement at call time.
pub type DeleteCheck = Box<dyn FnOnce(&DeleteStatement) + Send>;

/// One expected call and the outcome to return for it.
///
/// `entry` is what the call yields: the row for `get`, the `Vec` of rows
/// for `select`, the id for `create`, the closure output for `exec_raw`.
/// An error, when set, is returned after the entry has been written.
pub struct MockEntry {
    pub(crate) entry: Option<Box<dyn Any + Send>>,
    pub(crate) ok: bool,
    pub(crate) error: Option<DaoError>,
    pub(crate) select_check: Option<SelectCheck>,
    pub(crate) update_check: Option<UpdateCheck>,
    pub(crate) delete_check: Option<DeleteCheck>,
}

impl MockEntry {
    /// Entry from the raw (value, ok, error) triple.
    #[must_use]
    pub fn new<T: Any + Send>(entry: Option<T>, ok: bool, error: Option<DaoError>) -> Self {
        Self {
            entry: entry.map(|value| Box::new(value) as Box<dyn Any + Send>),
            ok,
            error,
            select_check: None,
            update_check: None,
            delete_check: None,
        }
    }

    /// Successful call yielding `value`.
    #[must_use]
    pub fn found<T: Any + Send>(value: T) -> Self {
        Self::new(Some(value), true, None)
    }

    /// Successful `create` returning `id`.
    #[must_use]
    pub fn created(id: i64) -> Self {
        Self::found(id)
    }

    /// Successful call without a value (`update`, `delete`).
    #[must_use]
    pub fn ok() -> Self {
        Self::new::<()>(None, true, None)
    }

    /// `get` that matched nothing.
    #[must_use]
    pub fn missing() -> Self {
        Self::new::<()>(None, false, None)
    }

    /// Failed call.
    #[must_use]
    pub fn error(error: DaoError) -> Self {
        Self::new::<()>(None, false, Some(error))
    }

    /// Asserts on the select statement before the outcome is returned.
    #[must_use]
    pub fn expect_select(mut self, check: impl FnOnce(&SelectStatement) + Send + 'static) -> Self {
        self.select_check = Some(Box::new(check));
        self
    }

    /// Asserts on the update statement before the outcome is returned.
    #[must_use]
    pub fn expect_update(mut self, check: impl FnOnce(&UpdateStatement) + Send + 'static) -> Self {
        self.update_check = Some(Box::new(check));
        self
    }

    /// Asserts on the delete statement before the outcome is returned.
    #[must_use]
    pub fn expect_delete(mut self, check: impl FnOnce(&DeleteStatement) + Send + 'static) -> Self {
        self.delete_check = Some(Box::new(check));
        self
    }

    pub(crate) fn check_select(&mut self, statement: &SelectStatement) {
        if let Some(check) = self.select_check.take() {
            check(statement);
        }
    }

    pub(crate) fn check_update(&mut self, statement: &UpdateStatement) {
        if let Some(check) = self.update_check.take() {
            check(statement);
        }
    }

    pub(crate) fn check_delete(&mut self, statement: &DeleteStatement) {
        if let Some(check) = self.delete_check.take() {
            check(statement);
        }
    }

    /// Takes the entry as `T`, panicking on a type mismatch.
    pub(crate) fn take_entry<T: Any>(&mut self, operation: &str) -> Option<T> {
        let entry = self.entry.take()?;
        match entry.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(_) => panic!(
                "mock entry for {} does not hold a {}",
                operation,
                std::any::type_name::<T>()
            ),
        }
    }

    pub(crate) fn take_error(&mut self) -> Option<DaoError> {
        self.error.take()
    }
}

impl fmt::Debug for MockEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockEntry")
            .field("has_entry", &self.entry.is_some())
            .field("ok", &self.ok)
            .field("error", &self.error)
            .field("select_check", &self.select_check.is_some())
            .field("update_check", &self.update_check.is_some())
            .field("delete_check", &self.delete_check.is_some())
            .finish()
    }
}
