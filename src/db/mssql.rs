//! SQL Server execution via tiberius over a bb8 pool.

use super::{decimal_to_json, f64_to_json, naive_datetime_to_json};
use crate::config::Settings;
use crate::error::AppError;
use crate::sql::{BindValue, ColumnKind, QueryBuf};
use crate::table::Record;
use bb8_tiberius::ConnectionManager;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use tiberius::numeric::Numeric;
use tiberius::{ColumnData, FromSql, Query, Row};

pub type SqlServerPool = bb8::Pool<ConnectionManager>;

/// Pool over an ADO.NET style connection string (`server=tcp:host,1433;user=..;password=..`).
pub(super) async fn connect(settings: &Settings) -> Result<SqlServerPool, AppError> {
    let manager = ConnectionManager::build(settings.connection_string.as_str())?;
    let pool = bb8::Pool::builder()
        .max_size(settings.max_connections)
        .connection_timeout(settings.acquire_timeout)
        .build(manager)
        .await?;
    Ok(pool)
}

pub(super) async fn fetch_all(pool: &SqlServerPool, q: &QueryBuf) -> Result<Vec<Record>, AppError> {
    let mut conn = pool.get().await?;
    let rows = build(q).query(&mut *conn).await?.into_first_result().await?;
    Ok(rows.iter().map(row_to_record).collect())
}

pub(super) async fn execute(pool: &SqlServerPool, q: &QueryBuf) -> Result<u64, AppError> {
    let mut conn = pool.get().await?;
    let result = build(q).execute(&mut *conn).await?;
    Ok(result.total())
}

fn build(q: &QueryBuf) -> Query<'_> {
    let mut query = Query::new(q.sql.as_str());
    for p in &q.params {
        bind(&mut query, p);
    }
    query
}

fn bind(query: &mut Query<'_>, v: &BindValue) {
    match v {
        BindValue::Null(kind) => match kind {
            ColumnKind::Integer => query.bind(None::<i64>),
            ColumnKind::Float => query.bind(None::<f64>),
            ColumnKind::Boolean => query.bind(None::<bool>),
            ColumnKind::Uuid => query.bind(None::<uuid::Uuid>),
            ColumnKind::Date => query.bind(None::<NaiveDate>),
            ColumnKind::Timestamp => query.bind(None::<NaiveDateTime>),
            ColumnKind::TimestampTz => query.bind(None::<DateTime<Utc>>),
            ColumnKind::Time => query.bind(None::<NaiveTime>),
            // NVARCHAR NULL converts implicitly to decimal and text columns
            ColumnKind::Decimal | ColumnKind::Json | ColumnKind::Text => query.bind(None::<String>),
        },
        BindValue::Bool(b) => query.bind(*b),
        BindValue::I64(n) => query.bind(*n),
        BindValue::F64(n) => query.bind(*n),
        BindValue::Decimal(d) => query.bind(to_numeric(d)),
        BindValue::Text(s) => query.bind(s.clone()),
        BindValue::Uuid(u) => query.bind(*u),
        BindValue::Date(d) => query.bind(*d),
        BindValue::Timestamp(d) => query.bind(*d),
        BindValue::TimestampTz(d) => query.bind(*d),
        BindValue::Time(t) => query.bind(*t),
        BindValue::Json(j) => query.bind(j.to_string()),
    }
}

/// tiberius binds decimals as its own `Numeric` (mantissa plus scale).
fn to_numeric(d: &rust_decimal::Decimal) -> Numeric {
    Numeric::new_with_scale(d.mantissa(), d.scale() as u8)
}

fn row_to_record(row: &Row) -> Record {
    let mut map = Record::new();
    for (col, data) in row.cells() {
        map.insert(col.name().to_string(), cell_to_value(data));
    }
    map
}

fn cell_to_value(data: &ColumnData<'static>) -> Value {
    match data {
        ColumnData::U8(v) => v.map(|n| Value::Number(n.into())).unwrap_or(Value::Null),
        ColumnData::I16(v) => v.map(|n| Value::Number(n.into())).unwrap_or(Value::Null),
        ColumnData::I32(v) => v.map(|n| Value::Number(n.into())).unwrap_or(Value::Null),
        ColumnData::I64(v) => v.map(|n| Value::Number(n.into())).unwrap_or(Value::Null),
        ColumnData::F32(v) => v.map(|n| f64_to_json(n as f64)).unwrap_or(Value::Null),
        ColumnData::F64(v) => v.map(f64_to_json).unwrap_or(Value::Null),
        ColumnData::Bit(v) => v.map(Value::Bool).unwrap_or(Value::Null),
        ColumnData::String(v) => v
            .as_ref()
            .map(|s| Value::String(s.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Guid(v) => v.map(|u| Value::String(u.to_string())).unwrap_or(Value::Null),
        ColumnData::Binary(v) => v
            .as_ref()
            .map(|b| Value::String(String::from_utf8_lossy(b).into_owned()))
            .unwrap_or(Value::Null),
        ColumnData::Numeric(_) => rust_decimal::Decimal::from_sql(data)
            .ok()
            .flatten()
            .map(decimal_to_json)
            .unwrap_or(Value::Null),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(data)
                .ok()
                .flatten()
                .map(naive_datetime_to_json)
                .unwrap_or(Value::Null)
        }
        ColumnData::Date(_) => NaiveDate::from_sql(data)
            .ok()
            .flatten()
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Time(_) => NaiveTime::from_sql(data)
            .ok()
            .flatten()
            .map(|t| Value::String(t.format("%H:%M:%S%.f").to_string()))
            .unwrap_or(Value::Null),
        ColumnData::DateTimeOffset(_) => DateTime::<Utc>::from_sql(data)
            .ok()
            .flatten()
            .map(|d| Value::String(d.to_rfc3339()))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
