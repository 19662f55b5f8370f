//! Mapping of records to insertable columns.

use pgdao_core::{DaoError, DaoResult};
use sea_query::{Alias, SimpleExpr, Value};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// A value that can be written as one row.
///
/// Implement it by hand to control column types exactly, or wrap any
/// `Serialize` struct in [`Serialized`] for field-name based mapping.
pub trait Record: Send + Sync {
    /// Column name and value expression pairs for the insert.
    fn columns(&self) -> DaoResult<Vec<(String, SimpleExpr)>>;
}

impl Record for Vec<(String, Value)> {
    fn columns(&self) -> DaoResult<Vec<(String, SimpleExpr)>> {
        Ok(self
            .iter()
            .map(|(name, value)| (name.clone(), SimpleExpr::from(value.clone())))
            .collect())
    }
}

/// Field-name based mapping through `serde`.
///
/// Each field of the serialized object becomes a column. Fields that
/// serialize to `null` are skipped so the column default applies; nested
/// arrays and objects are stored as JSON. Strings are bound as text, so
/// fields serde renders as strings for other column types (timestamps,
/// UUIDs) need a [`cast`](Serialized::cast).
#[derive(Debug, Clone, Copy)]
pub struct Serialized<'a, T>(pub &'a T);

impl<'a, T> Serialized<'a, T> {
    /// Binds `column` as `CAST($n AS sql_type)`.
    #[must_use]
    pub fn cast(self, column: &str, sql_type: &str) -> Casted<'a, T> {
        Casted {
            record: self.0,
            casts: Vec::new(),
        }
        .cast(column, sql_type)
    }
}

impl<T: Serialize + Sync> Record for Serialized<'_, T> {
    fn columns(&self) -> DaoResult<Vec<(String, SimpleExpr)>> {
        Ok(to_columns(self.0)?
            .into_iter()
            .map(|(name, value)| (name, SimpleExpr::from(value)))
            .collect())
    }
}

/// [`Serialized`] with SQL casts on selected columns.
#[derive(Debug, Clone)]
pub struct Casted<'a, T> {
    record: &'a T,
    casts: Vec<(String, String)>,
}

impl<T> Casted<'_, T> {
    /// Adds another column cast.
    #[must_use]
    pub fn cast(mut self, column: &str, sql_type: &str) -> Self {
        self.casts.push((column.to_string(), sql_type.to_string()));
        self
    }

    fn cast_for(&self, column: &str) -> Option<&str> {
        self.casts
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, sql_type)| sql_type.as_str())
    }
}

impl<T: Serialize + Sync> Record for Casted<'_, T> {
    fn columns(&self) -> DaoResult<Vec<(String, SimpleExpr)>> {
        Ok(to_columns(self.record)?
            .into_iter()
            .map(|(name, value)| {
                let expr = match self.cast_for(&name) {
                    Some(sql_type) => SimpleExpr::from(value).cast_as(Alias::new(sql_type)),
                    None => SimpleExpr::from(value),
                };
                (name, expr)
            })
            .collect())
    }
}

/// Serializes `record` and converts each non-null field to a column value.
///
/// Integers outside the `i64` range are rejected rather than widened to
/// floating point.
pub fn to_columns<T: Serialize + ?Sized>(record: &T) -> DaoResult<Vec<(String, Value)>> {
    match serde_json::to_value(record)? {
        JsonValue::Object(fields) => fields
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| {
                let value = json_to_value(&name, value)?;
                Ok((name, value))
            })
            .collect(),
        other => Err(DaoError::Mapping(format!(
            "expected a struct or map, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_to_value(name: &str, value: JsonValue) -> DaoResult<Value> {
    let value = match value {
        JsonValue::Bool(b) => Value::from(b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if n.is_f64() {
                Value::from(n.as_f64().unwrap_or_default())
            } else {
                return Err(DaoError::Mapping(format!(
                    "field {} value {} does not fit a BIGINT",
                    name, n
                )));
            }
        }
        JsonValue::String(s) => Value::from(s),
        nested => Value::from(nested),
    };
    Ok(value)
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
