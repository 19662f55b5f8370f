//! Pagination parameters applied to select statements.

use crate::{column_ref, order_key};
use sea_query::{Order, SelectStatement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The default page size when a request leaves the limit at zero.
pub const DEFAULT_LIMIT: u64 = 15;
/// The maximum allowed page size.
pub const MAX_LIMIT: u64 = 100;

/// Sort direction for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Keyword used in `ORDER BY` fragments.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn effective_limit(limit: u64) -> u64 {
    if limit == 0 {
        DEFAULT_LIMIT
    } else {
        limit.min(MAX_LIMIT)
    }
}

/// Offset based page request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetPageParams {
    /// Items per page; zero selects [`DEFAULT_LIMIT`].
    #[serde(default)]
    pub limit: u64,
    /// Page number (0-indexed).
    #[serde(default)]
    pub page_number: u64,
    /// Sort direction of the key column.
    #[serde(default)]
    pub order: SortOrder,
}

impl OffsetPageParams {
    /// Creates a new page request.
    #[must_use]
    pub fn new(page_number: u64, limit: u64, order: SortOrder) -> Self {
        Self {
            limit,
            page_number,
            order,
        }
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub fn limit(&self) -> u64 {
        effective_limit(self.limit)
    }

    /// Returns the offset for database queries.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.limit().saturating_mul(self.page_number)
    }

    /// Adds `LIMIT`, `OFFSET` and `ORDER BY column` to the statement.
    pub fn apply_to(&self, stmt: &mut SelectStatement, column: &str) {
        stmt.limit(self.limit())
            .offset(self.offset())
            .order_by_expr(order_key(column), self.order.into());
    }
}

/// Keyset (cursor) based page request.
///
/// With descending order a zero cursor means "start from the newest row".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPageParams {
    /// Last key seen by the client.
    #[serde(default)]
    pub cursor: i64,
    /// Items per page; zero selects [`DEFAULT_LIMIT`].
    #[serde(default)]
    pub limit: u64,
    /// Sort direction of the key column.
    #[serde(default)]
    pub order: SortOrder,
}

impl CursorPageParams {
    /// Creates a new cursor request.
    #[must_use]
    pub fn new(cursor: i64, limit: u64, order: SortOrder) -> Self {
        Self {
            cursor,
            limit,
            order,
        }
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub fn limit(&self) -> u64 {
        effective_limit(self.limit)
    }

    /// Returns the cursor bound actually used in the predicate.
    #[must_use]
    pub fn effective_cursor(&self) -> i64 {
        match self.order {
            SortOrder::Desc if self.cursor == 0 => i64::MAX,
            _ => self.cursor,
        }
    }

    /// Adds the keyset predicate, `ORDER BY column` and `LIMIT` to the statement.
    pub fn apply_to(&self, stmt: &mut SelectStatement, column: &str) {
        let key = column_ref(column);
        let predicate = match self.order {
            SortOrder::Asc => key.gt(self.effective_cursor()),
            SortOrder::Desc => key.lt(self.effective_cursor()),
        };
        stmt.and_where(predicate)
            .order_by_expr(order_key(column), self.order.into())
            .limit(self.limit());
    }
}
