//! Accumulated builder state shared by every DAO implementation.
//!
//! A [`QueryState`] holds one select, one update and one delete statement
//! for a single table. Chain calls only ever append clauses; there is no
//! way to remove a filter once added.

use chrono::{DateTime, Utc};
use pgdao_core::{
    column_name, column_ref, order_key, CursorPageParams, DaoResult, OffsetPageParams, CREATED_AT_COLUMN,
    ID_COLUMN,
};
use sea_query::{
    Alias, Asterisk, DeleteStatement, Expr, Func, InsertStatement, Order, PostgresQueryBuilder, Query,
    SelectStatement, SimpleExpr, UpdateStatement, Value,
};
use tracing::trace;

/// Row shape produced by a [`QueryState::count`] select.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct RowCount {
    pub count: i64,
}

/// Select, update and delete statements under construction for one table.
#[derive(Debug, Clone)]
pub struct QueryState {
    table: String,
    select: SelectStatement,
    update: UpdateStatement,
    delete: DeleteStatement,
}

impl QueryState {
    /// Fresh state selecting `table.*`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        let select = Query::select()
            .column((Alias::new(&table), Asterisk))
            .from(Alias::new(&table))
            .to_owned();
        Self::with_select(table, select)
    }

    /// Fresh state selecting `count(*) AS count`.
    #[must_use]
    pub fn count(table: impl Into<String>) -> Self {
        let table = table.into();
        let select = Query::select()
            .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
            .from(Alias::new(&table))
            .to_owned();
        Self::with_select(table, select)
    }

    fn with_select(table: String, select: SelectStatement) -> Self {
        let update = Query::update().table(Alias::new(&table)).to_owned();
        let delete = Query::delete().from_table(Alias::new(&table)).to_owned();
        Self {
            table,
            select,
            update,
            delete,
        }
    }

    /// Target table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The select statement as built so far.
    #[must_use]
    pub fn select_statement(&self) -> &SelectStatement {
        &self.select
    }

    /// The update statement as built so far.
    #[must_use]
    pub fn update_statement(&self) -> &UpdateStatement {
        &self.update
    }

    /// The delete statement as built so far.
    #[must_use]
    pub fn delete_statement(&self) -> &DeleteStatement {
        &self.delete
    }

    /// Select statement rendered with inlined values.
    #[must_use]
    pub fn select_sql(&self) -> String {
        self.select.to_string(PostgresQueryBuilder)
    }

    /// Update statement rendered with inlined values.
    #[must_use]
    pub fn update_sql(&self) -> String {
        self.update.to_string(PostgresQueryBuilder)
    }

    /// Delete statement rendered with inlined values.
    #[must_use]
    pub fn delete_sql(&self) -> String {
        self.delete.to_string(PostgresQueryBuilder)
    }

    /// `INSERT INTO table (...) VALUES (...) RETURNING id`.
    pub fn insert_statement(&self, columns: Vec<(String, SimpleExpr)>) -> DaoResult<InsertStatement> {
        let (names, values): (Vec<_>, Vec<_>) = columns
            .into_iter()
            .map(|(name, value)| (Alias::new(column_name(&name)), value))
            .unzip();

        let mut insert = Query::insert();
        insert.into_table(Alias::new(&self.table)).columns(names);
        insert.values(values)?;
        insert.returning_col(Alias::new(ID_COLUMN));
        Ok(insert)
    }

    /// Adds `id = id` to the select.
    pub fn filter_by_id(&mut self, id: i64) -> &mut Self {
        trace!(table = %self.table, id, "Filtering by id");
        self.select.and_where(column_ref(ID_COLUMN).eq(id));
        self
    }

    /// Adds `column > value` to the select.
    pub fn filter_greater(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        trace!(table = %self.table, column, ?value, "Filtering greater");
        self.select.and_where(column_ref(column).gt(value));
        self
    }

    /// Adds `column < value` to the select.
    pub fn filter_less(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        trace!(table = %self.table, column, ?value, "Filtering less");
        self.select.and_where(column_ref(column).lt(value));
        self
    }

    /// Adds `column = value` to the select.
    pub fn filter_by_column(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        trace!(table = %self.table, column, ?value, "Filtering by column");
        self.select.and_where(column_ref(column).eq(value));
        self
    }

    /// Keeps rows created strictly after `time`.
    pub fn filter_only_after(&mut self, time: DateTime<Utc>) -> &mut Self {
        trace!(table = %self.table, %time, "Filtering after time");
        self.select.and_where(column_ref(CREATED_AT_COLUMN).gt(time));
        self
    }

    /// Keeps rows created strictly before `time`.
    pub fn filter_only_before(&mut self, time: DateTime<Utc>) -> &mut Self {
        trace!(table = %self.table, %time, "Filtering before time");
        self.select.and_where(column_ref(CREATED_AT_COLUMN).lt(time));
        self
    }

    /// Sets the select `LIMIT`; the last call wins.
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        trace!(table = %self.table, limit, "Limiting rows");
        self.select.limit(limit);
        self
    }

    /// Appends `column ASC` to the select ordering. `column` is used verbatim.
    pub fn order_by_asc(&mut self, column: &str) -> &mut Self {
        trace!(table = %self.table, column, "Ordering ascending");
        self.select.order_by_expr(order_key(column), Order::Asc);
        self
    }

    /// Appends `column DESC` to the select ordering. `column` is used verbatim.
    pub fn order_by_desc(&mut self, column: &str) -> &mut Self {
        trace!(table = %self.table, column, "Ordering descending");
        self.select.order_by_expr(order_key(column), Order::Desc);
        self
    }

    /// Applies offset pagination keyed on `column`.
    pub fn page(&mut self, params: &OffsetPageParams, column: &str) -> &mut Self {
        trace!(table = %self.table, ?params, column, "Applying page params");
        params.apply_to(&mut self.select, column);
        self
    }

    /// Applies keyset pagination keyed on `column`.
    pub fn cursor(&mut self, params: &CursorPageParams, column: &str) -> &mut Self {
        trace!(table = %self.table, ?params, column, "Applying cursor params");
        params.apply_to(&mut self.select, column);
        self
    }

    /// Restricts the update to the row with `id`.
    pub fn update_where_id(&mut self, id: i64) -> &mut Self {
        trace!(table = %self.table, id, "Updating by id");
        self.update.and_where(column_ref(ID_COLUMN).eq(id));
        self
    }

    /// Adds `column = value` to the update's `SET` list.
    pub fn update_column(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        trace!(table = %self.table, column, ?value, "Updating column");
        self.update.value(Alias::new(column_name(column)), value);
        self
    }

    /// Adds `column = value` to the delete.
    pub fn delete_where_val(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        trace!(table = %self.table, column, ?value, "Deleting where column");
        self.delete.and_where(column_ref(column).eq(value));
        self
    }

    /// Restricts the delete to the row with `id`.
    pub fn delete_where_id(&mut self, id: i64) -> &mut Self {
        trace!(table = %self.table, id, "Deleting by id");
        self.delete.and_where(column_ref(ID_COLUMN).eq(id));
        self
    }
}
