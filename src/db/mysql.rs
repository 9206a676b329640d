//! MySQL / MariaDB execution via sqlx.

use super::{decimal_to_json, f64_to_json, naive_datetime_to_json};
use crate::error::AppError;
use crate::sql::{BindValue, ColumnKind, QueryBuf};
use crate::table::Record;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use sqlx::mysql::{MySqlArguments, MySqlPool, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySql, Row, TypeInfo, ValueRef};

type MySqlQuery<'q> = Query<'q, MySql, MySqlArguments>;

pub(super) async fn fetch_all(pool: &MySqlPool, q: &QueryBuf) -> Result<Vec<Record>, AppError> {
    let rows = build(q).fetch_all(pool).await?;
    Ok(rows.iter().map(row_to_record).collect())
}

pub(super) async fn execute(pool: &MySqlPool, q: &QueryBuf) -> Result<u64, AppError> {
    let result = build(q).execute(pool).await?;
    Ok(result.rows_affected())
}

fn build(q: &QueryBuf) -> MySqlQuery<'_> {
    q.params.iter().fold(sqlx::query(&q.sql), bind)
}

fn bind<'q>(query: MySqlQuery<'q>, v: &BindValue) -> MySqlQuery<'q> {
    match v {
        BindValue::Null(kind) => match kind {
            ColumnKind::Integer => query.bind(None::<i64>),
            ColumnKind::Float => query.bind(None::<f64>),
            ColumnKind::Decimal => query.bind(None::<rust_decimal::Decimal>),
            ColumnKind::Boolean => query.bind(None::<bool>),
            ColumnKind::Date => query.bind(None::<NaiveDate>),
            ColumnKind::Timestamp => query.bind(None::<NaiveDateTime>),
            ColumnKind::TimestampTz => query.bind(None::<DateTime<Utc>>),
            ColumnKind::Time => query.bind(None::<NaiveTime>),
            ColumnKind::Uuid | ColumnKind::Json | ColumnKind::Text => query.bind(None::<String>),
        },
        BindValue::Bool(b) => query.bind(*b),
        BindValue::I64(n) => query.bind(*n),
        BindValue::F64(n) => query.bind(*n),
        BindValue::Decimal(d) => query.bind(*d),
        BindValue::Text(s) => query.bind(s.clone()),
        // MySQL has no uuid type; uuids live in CHAR(36) columns
        BindValue::Uuid(u) => query.bind(u.hyphenated().to_string()),
        BindValue::Date(d) => query.bind(*d),
        BindValue::Timestamp(d) => query.bind(*d),
        BindValue::TimestampTz(d) => query.bind(*d),
        BindValue::Time(t) => query.bind(*t),
        BindValue::Json(j) => query.bind(j.clone()),
    }
}

fn row_to_record(row: &MySqlRow) -> Record {
    let mut map = Record::new();
    for (i, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), cell_to_value(row, i));
    }
    map
}

fn cell_to_value(row: &MySqlRow, i: usize) -> Value {
    if row.try_get_raw(i).map(|v| v.is_null()).unwrap_or(true) {
        return Value::Null;
    }
    // TINYINT(1) is MySQL's boolean
    if row.column(i).type_info().name() == "BOOLEAN" {
        if let Ok(b) = row.try_get::<bool, _>(i) {
            return Value::Bool(b);
        }
    }
    if let Ok(n) = row.try_get::<i64, _>(i) {
        return Value::Number(n.into());
    }
    if let Ok(n) = row.try_get::<u64, _>(i) {
        return Value::Number(n.into());
    }
    if let Ok(n) = row.try_get::<f32, _>(i) {
        return f64_to_json(n as f64);
    }
    if let Ok(n) = row.try_get::<f64, _>(i) {
        return f64_to_json(n);
    }
    if let Ok(d) = row.try_get::<rust_decimal::Decimal, _>(i) {
        return decimal_to_json(d);
    }
    if let Ok(d) = row.try_get::<DateTime<Utc>, _>(i) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(d) = row.try_get::<NaiveDateTime, _>(i) {
        return naive_datetime_to_json(d);
    }
    if let Ok(d) = row.try_get::<NaiveDate, _>(i) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(t) = row.try_get::<NaiveTime, _>(i) {
        return Value::String(t.format("%H:%M:%S%.f").to_string());
    }
    if let Ok(s) = row.try_get::<String, _>(i) {
        return Value::String(s);
    }
    if let Ok(j) = row.try_get::<Value, _>(i) {
        return j;
    }
    row.try_get_unchecked::<Vec<u8>, _>(i)
        .map(|b| Value::String(String::from_utf8_lossy(&b).into_owned()))
        .unwrap_or(Value::Null)
}
