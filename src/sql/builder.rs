//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for any table through a `Dialect`.
//! Only quoted identifiers are templated into SQL text; values always go through params.

use crate::error::AppError;
use crate::sql::dialect::{Dialect, Returning};
use crate::sql::params::{is_bare_date, BindValue, ColumnKind};
use crate::table::{ColumnInfo, ColumnSet, Record, TableRef};
use chrono::NaiveDate;
use serde_json::Value;

#[derive(Clone, Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    pub fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Append a parameter and return its 1-based position.
    pub fn push_param(&mut self, v: BindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

fn kind_of(columns: &ColumnSet, name: &str) -> ColumnKind {
    columns.get(name).map(ColumnInfo::kind).unwrap_or(ColumnKind::Text)
}

/// Output column list. `*` unless the dialect needs to convert some column for decoding,
/// in which case every column is listed in catalog order.
pub fn projection(dialect: &dyn Dialect, columns: &ColumnSet) -> String {
    let converted: Vec<Option<String>> = columns.iter().map(|c| dialect.select_expr(c)).collect();
    if converted.iter().all(Option::is_none) {
        return "*".to_string();
    }
    columns
        .iter()
        .zip(converted)
        .map(|(c, expr)| expr.unwrap_or_else(|| dialect.quote_identifier(&c.name)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `col = ?` for the filter column. A bare `YYYY-MM-DD` against a timestamp column
/// compares the column's date part instead.
fn key_predicate(
    q: &mut QueryBuf,
    dialect: &dyn Dialect,
    column: &ColumnInfo,
    value: &Value,
) -> Result<String, AppError> {
    let kind = column.kind();
    let quoted = dialect.quote_identifier(&column.name);
    if kind.is_datetime() {
        if let Some(date) = value
            .as_str()
            .filter(|s| is_bare_date(s))
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        {
            let n = q.push_param(BindValue::Date(date));
            return Ok(format!("{} = {}", dialect.date_part(&quoted), dialect.placeholder(n)));
        }
    }
    let n = q.push_param(BindValue::from_json(value, kind, &column.name)?);
    Ok(format!("{} = {}", quoted, dialect.placeholder(n)))
}

/// SELECT capped at `limit` rows, in engine order.
pub fn select_list(dialect: &dyn Dialect, table: &TableRef, columns: &ColumnSet, limit: u32) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = dialect.select_limited(&projection(dialect, columns), &dialect.qualified_table(table), limit);
    q
}

/// SELECT WHERE key = value.
pub fn select_by_key(
    dialect: &dyn Dialect,
    table: &TableRef,
    columns: &ColumnSet,
    key: &ColumnInfo,
    value: &Value,
) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let pred = key_predicate(&mut q, dialect, key, value)?;
    q.sql = format!(
        "SELECT {} FROM {} WHERE {}",
        projection(dialect, columns),
        dialect.qualified_table(table),
        pred
    );
    Ok(q)
}

/// INSERT over the record's fields, in record order. Caller guarantees every field is a real column.
pub fn insert(dialect: &dyn Dialect, table: &TableRef, columns: &ColumnSet, record: &Record) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut cols = Vec::with_capacity(record.len());
    let mut placeholders = Vec::with_capacity(record.len());
    for (name, value) in record {
        let n = q.push_param(BindValue::from_json(value, kind_of(columns, name), name)?);
        cols.push(dialect.quote_identifier(name));
        placeholders.push(dialect.placeholder(n));
    }
    let table = dialect.qualified_table(table);
    let cols = cols.join(", ");
    let placeholders = placeholders.join(", ");
    q.sql = match dialect.returning() {
        Returning::Suffix => format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols,
            placeholders,
            projection(dialect, columns)
        ),
        Returning::Output => format!("INSERT INTO {} ({}) OUTPUT INSERTED.* VALUES ({})", table, cols, placeholders),
        Returning::None => format!("INSERT INTO {} ({}) VALUES ({})", table, cols, placeholders),
    };
    Ok(q)
}

/// UPDATE SET only the supplied fields WHERE key = value. SET params come first.
pub fn update(
    dialect: &dyn Dialect,
    table: &TableRef,
    columns: &ColumnSet,
    key: &ColumnInfo,
    key_value: &Value,
    record: &Record,
) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut sets = Vec::with_capacity(record.len());
    for (name, value) in record {
        let n = q.push_param(BindValue::from_json(value, kind_of(columns, name), name)?);
        sets.push(format!("{} = {}", dialect.quote_identifier(name), dialect.placeholder(n)));
    }
    let pred = key_predicate(&mut q, dialect, key, key_value)?;
    q.sql = format!(
        "UPDATE {} SET {} WHERE {}",
        dialect.qualified_table(table),
        sets.join(", "),
        pred
    );
    Ok(q)
}

/// DELETE WHERE key = value.
pub fn delete(dialect: &dyn Dialect, table: &TableRef, key: &ColumnInfo, value: &Value) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let pred = key_predicate(&mut q, dialect, key, value)?;
    q.sql = format!("DELETE FROM {} WHERE {}", dialect.qualified_table(table), pred);
    Ok(q)
}
