//! Convert JSON values and path strings into typed values the drivers can bind.

use crate::error::AppError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Column type family derived from the catalog `data_type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Decimal,
    Boolean,
    Uuid,
    Date,
    Timestamp,
    TimestampTz,
    Time,
    Json,
    Text,
}

impl ColumnKind {
    /// Classify a catalog type name from any supported engine.
    pub fn from_data_type(data_type: &str) -> Self {
        match data_type.trim().to_lowercase().as_str() {
            "int" | "integer" | "int2" | "int4" | "int8" | "smallint" | "bigint" | "tinyint" | "mediumint"
            | "serial" | "bigserial" | "smallserial" | "year" => ColumnKind::Integer,
            "real" | "float" | "float4" | "float8" | "double" | "double precision" => ColumnKind::Float,
            "numeric" | "decimal" | "money" | "smallmoney" => ColumnKind::Decimal,
            "boolean" | "bool" | "bit" => ColumnKind::Boolean,
            "uuid" | "uniqueidentifier" => ColumnKind::Uuid,
            "date" => ColumnKind::Date,
            "timestamp" | "timestamp without time zone" | "datetime" | "datetime2" | "smalldatetime" => {
                ColumnKind::Timestamp
            }
            "timestamptz" | "timestamp with time zone" | "datetimeoffset" => ColumnKind::TimestampTz,
            "time" | "time without time zone" => ColumnKind::Time,
            "json" | "jsonb" => ColumnKind::Json,
            _ => ColumnKind::Text,
        }
    }

    /// Human name used in validation messages.
    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "floating point number",
            ColumnKind::Decimal => "decimal",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Uuid => "uuid",
            ColumnKind::Date => "date",
            ColumnKind::Timestamp | ColumnKind::TimestampTz => "timestamp",
            ColumnKind::Time => "time",
            ColumnKind::Json => "json value",
            ColumnKind::Text => "text",
        }
    }

    /// Date-bearing columns support the date-only equality match.
    pub fn is_datetime(&self) -> bool {
        matches!(self, ColumnKind::Timestamp | ColumnKind::TimestampTz)
    }
}

/// A value ready to be bound as a statement parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    /// Typed NULL, so engines with strict parameter typing accept it.
    Null(ColumnKind),
    Bool(bool),
    I64(i64),
    F64(f64),
    Decimal(Decimal),
    Text(String),
    Uuid(uuid::Uuid),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Time(NaiveTime),
    Json(Value),
}

impl BindValue {
    /// Convert a JSON value for `column` of the given kind. A value the column's type
    /// cannot hold is a validation error, so the engine never sees it.
    pub fn from_json(v: &Value, kind: ColumnKind, column: &str) -> Result<Self, AppError> {
        let bound = match v {
            Value::Null => Some(BindValue::Null(kind)),
            Value::Bool(b) => match kind {
                ColumnKind::Integer => Some(BindValue::I64(*b as i64)),
                ColumnKind::Text => Some(BindValue::Text(b.to_string())),
                ColumnKind::Boolean => Some(BindValue::Bool(*b)),
                ColumnKind::Json => Some(BindValue::Json(v.clone())),
                _ => None,
            },
            Value::Number(n) => match kind {
                ColumnKind::Integer => n.as_i64().map(BindValue::I64),
                ColumnKind::Decimal => parse_decimal(&n.to_string()).map(BindValue::Decimal),
                ColumnKind::Float => n.as_f64().map(BindValue::F64),
                ColumnKind::Boolean => n.as_f64().map(|f| BindValue::Bool(f != 0.0)),
                ColumnKind::Text => Some(BindValue::Text(n.to_string())),
                ColumnKind::Json => Some(BindValue::Json(v.clone())),
                _ => None,
            },
            Value::String(s) => return Self::from_text(s, kind, column),
            Value::Array(_) | Value::Object(_) => Some(BindValue::Json(v.clone())),
        };
        bound.ok_or_else(|| mismatch(v, kind, column))
    }

    /// Convert a string (path segment or JSON string) for `column` of the given kind.
    pub fn from_text(s: &str, kind: ColumnKind, column: &str) -> Result<Self, AppError> {
        let parsed = match kind {
            ColumnKind::Integer => s.trim().parse::<i64>().ok().map(BindValue::I64),
            ColumnKind::Float => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(BindValue::F64),
            ColumnKind::Decimal => parse_decimal(s.trim()).map(BindValue::Decimal),
            ColumnKind::Boolean => parse_bool(s).map(BindValue::Bool),
            ColumnKind::Uuid => uuid::Uuid::parse_str(s.trim()).ok().map(BindValue::Uuid),
            ColumnKind::Date => parse_date(s).map(BindValue::Date),
            ColumnKind::Timestamp => parse_datetime(s).map(|d| BindValue::Timestamp(d.naive_utc())),
            ColumnKind::TimestampTz => parse_datetime(s).map(BindValue::TimestampTz),
            ColumnKind::Time => parse_time(s).map(BindValue::Time),
            ColumnKind::Json => Some(BindValue::Json(
                serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string())),
            )),
            ColumnKind::Text => Some(BindValue::Text(s.to_string())),
        };
        parsed.ok_or_else(|| mismatch(&Value::String(s.to_string()), kind, column))
    }
}

fn mismatch(v: &Value, kind: ColumnKind, column: &str) -> AppError {
    let shown = match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    AppError::Validation(format!(
        "value '{}' is not a valid {} for column {}",
        shown,
        kind.label(),
        column
    ))
}

/// `YYYY-MM-DD` with no time part.
pub fn is_bare_date(s: &str) -> bool {
    s.len() == 10 && s.matches('-').count() == 2 && !s.contains('T') && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s).ok().or_else(|| Decimal::from_scientific(s).ok())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "si" | "sí" | "t" => Some(true),
        "false" | "0" | "no" | "f" => Some(false),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.contains('T') || s.contains(' ') {
        return parse_datetime(s).map(|d| d.date_naive());
    }
    NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok()
}

/// ISO-8601 date-time; a missing offset is read as UTC, a bare date as midnight.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(&s.replace(' ', "T")) {
        return Some(d.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(d) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(d.and_utc());
        }
    }
    if is_bare_date(s) {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc());
    }
    None
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}
