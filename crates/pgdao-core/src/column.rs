//! Column references given as plain strings.

use sea_query::{Alias, Expr, SimpleExpr};

/// Column reference for `name`, which may be qualified (`accounts.id`).
#[must_use]
pub fn column_ref(name: &str) -> Expr {
    match name.split_once('.') {
        Some((table, column)) => Expr::col((Alias::new(table), Alias::new(column))),
        None => Expr::col(Alias::new(name)),
    }
}

/// `name` without its table qualifier.
///
/// Postgres rejects qualified names in `SET` and insert column lists.
#[must_use]
pub fn column_name(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(_, column)| column)
}

/// `ORDER BY` key taken verbatim, so qualified names and expressions pass
/// through unquoted.
#[must_use]
pub fn order_key(name: &str) -> SimpleExpr {
    Expr::cust(name)
}
