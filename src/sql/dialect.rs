//! Engine dialects: identifier quoting, placeholders, default schema, catalog introspection.
//!
//! Everything above this module is engine-agnostic. A new engine needs one `Dialect`
//! impl plus one arm in `dialect_for`.

use crate::config::Engine;
use crate::db::Executor;
use crate::error::AppError;
use crate::sql::{BindValue, ColumnKind, QueryBuf};
use crate::table::{ColumnInfo, ColumnSet, Record, TableRef};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// How an INSERT reports the row it wrote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Returning {
    /// `... RETURNING *`
    Suffix,
    /// `INSERT INTO t (..) OUTPUT INSERTED.* VALUES (..)`
    Output,
    /// Engine cannot return the row; the written record is echoed.
    None,
}

#[async_trait]
pub trait Dialect: Send + Sync {
    fn engine(&self) -> Engine;

    /// Wrap a table/column/schema name in the engine's quoting syntax.
    fn quote_identifier(&self, name: &str) -> String;

    /// Positional parameter token for 1-based `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Implicit schema when the request names none. `None` means the connection's database.
    fn default_schema(&self) -> Option<&'static str>;

    fn returning(&self) -> Returning;

    /// Catalog query for the table's columns in ordinal order.
    fn columns_query(&self, table: &TableRef) -> QueryBuf;

    /// Expression for the date part of a quoted column.
    fn date_part(&self, quoted_column: &str) -> String {
        format!("CAST({} AS DATE)", quoted_column)
    }

    /// Select-list entry for a column the driver cannot decode as-is, aliased to the
    /// column's own name. `None` selects the column unchanged.
    fn select_expr(&self, _column: &ColumnInfo) -> Option<String> {
        None
    }

    /// `SELECT` of `projection` capped at `limit` rows.
    fn select_limited(&self, projection: &str, qualified_table: &str, limit: u32) -> String {
        format!("SELECT {} FROM {} LIMIT {}", projection, qualified_table, limit)
    }

    fn qualified_table(&self, table: &TableRef) -> String {
        let schema = table.schema.as_deref().or(self.default_schema());
        match schema {
            Some(s) => format!("{}.{}", self.quote_identifier(s), self.quote_identifier(&table.name)),
            None => self.quote_identifier(&table.name),
        }
    }

    /// Introspect the table's columns. Fails with NotFound when the catalog has none.
    async fn list_columns(&self, table: &TableRef, executor: &dyn Executor) -> Result<ColumnSet, AppError> {
        let q = self.columns_query(table);
        let rows = executor.fetch_all(&q).await?;
        let columns: Vec<ColumnInfo> = rows.iter().filter_map(column_from_catalog_row).collect();
        if columns.is_empty() {
            return Err(AppError::not_found(format!("table '{}' does not exist", table.display_name())));
        }
        Ok(ColumnSet::new(columns))
    }
}

fn column_from_catalog_row(row: &Record) -> Option<ColumnInfo> {
    let name = row.get("column_name")?.as_str()?.to_string();
    let data_type = row
        .get("data_type")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_lowercase();
    Some(ColumnInfo {
        name,
        data_type,
        nullable: truthy(row.get("nullable")),
        has_default: truthy(row.get("has_default")),
    })
}

/// Catalog flags come back as bool, 0/1 or 'YES'/'NO' depending on the engine.
fn truthy(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().map(|i| i != 0).unwrap_or(false),
        Some(Value::String(s)) => s.eq_ignore_ascii_case("yes") || s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn text_param(s: &str) -> BindValue {
    BindValue::Text(s.to_string())
}

pub struct PostgresDialect;

#[async_trait]
impl Dialect for PostgresDialect {
    fn engine(&self) -> Engine {
        Engine::Postgres
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn default_schema(&self) -> Option<&'static str> {
        Some("public")
    }

    fn returning(&self) -> Returning {
        Returning::Suffix
    }

    /// sqlx reads results in binary, so arrays, bytea, money and every type without a
    /// native decoder (interval, inet, enums, ...) are converted server-side.
    fn select_expr(&self, column: &ColumnInfo) -> Option<String> {
        let quoted = self.quote_identifier(&column.name);
        let expr = match column.data_type.as_str() {
            "array" => format!("array_to_json({})", quoted),
            "bytea" => format!("encode({}, 'hex')", quoted),
            "money" => format!("{}::numeric", quoted),
            "bit" | "bit varying" => format!("{}::text", quoted),
            "text" | "character varying" | "varchar" | "character" | "char" | "bpchar" | "name" => return None,
            other if ColumnKind::from_data_type(other) != ColumnKind::Text => return None,
            _ => format!("{}::text", quoted),
        };
        Some(format!("{} AS {}", expr, quoted))
    }

    fn columns_query(&self, table: &TableRef) -> QueryBuf {
        let mut q = QueryBuf::new();
        let schema = q.push_param(text_param(table.schema.as_deref().unwrap_or("public")));
        let name = q.push_param(text_param(&table.name));
        q.sql = format!(
            "SELECT column_name::text AS column_name, data_type::text AS data_type, \
             (is_nullable = 'YES') AS nullable, \
             (column_default IS NOT NULL OR is_identity = 'YES') AS has_default \
             FROM information_schema.columns \
             WHERE table_schema = {} AND table_name = {} \
             ORDER BY ordinal_position",
            self.placeholder(schema),
            self.placeholder(name)
        );
        q
    }
}

pub struct MySqlDialect;

#[async_trait]
impl Dialect for MySqlDialect {
    fn engine(&self) -> Engine {
        Engine::MySql
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn default_schema(&self) -> Option<&'static str> {
        None
    }

    fn returning(&self) -> Returning {
        Returning::None
    }

    fn date_part(&self, quoted_column: &str) -> String {
        format!("DATE({})", quoted_column)
    }

    fn columns_query(&self, table: &TableRef) -> QueryBuf {
        let mut q = QueryBuf::new();
        let schema_pred = match &table.schema {
            Some(s) => {
                let n = q.push_param(text_param(s));
                format!("TABLE_SCHEMA = {}", self.placeholder(n))
            }
            None => "TABLE_SCHEMA = DATABASE()".to_string(),
        };
        let name = q.push_param(text_param(&table.name));
        q.sql = format!(
            "SELECT CAST(COLUMN_NAME AS CHAR) AS column_name, CAST(DATA_TYPE AS CHAR) AS data_type, \
             (IS_NULLABLE = 'YES') AS nullable, \
             (COLUMN_DEFAULT IS NOT NULL OR EXTRA LIKE '%auto_increment%') AS has_default \
             FROM information_schema.COLUMNS \
             WHERE {} AND TABLE_NAME = {} \
             ORDER BY ORDINAL_POSITION",
            schema_pred,
            self.placeholder(name)
        );
        q
    }
}

pub struct SqlServerDialect;

#[async_trait]
impl Dialect for SqlServerDialect {
    fn engine(&self) -> Engine {
        Engine::SqlServer
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@P{}", index)
    }

    fn default_schema(&self) -> Option<&'static str> {
        Some("dbo")
    }

    fn returning(&self) -> Returning {
        Returning::Output
    }

    fn select_limited(&self, projection: &str, qualified_table: &str, limit: u32) -> String {
        format!("SELECT TOP ({}) {} FROM {}", limit, projection, qualified_table)
    }

    fn columns_query(&self, table: &TableRef) -> QueryBuf {
        let mut q = QueryBuf::new();
        let schema = q.push_param(text_param(table.schema.as_deref().unwrap_or("dbo")));
        let name = q.push_param(text_param(&table.name));
        q.sql = format!(
            "SELECT COLUMN_NAME AS column_name, DATA_TYPE AS data_type, \
             CAST(CASE WHEN IS_NULLABLE = 'YES' THEN 1 ELSE 0 END AS BIT) AS nullable, \
             CAST(CASE WHEN COLUMN_DEFAULT IS NOT NULL \
               OR COLUMNPROPERTY(OBJECT_ID(QUOTENAME(TABLE_SCHEMA) + '.' + QUOTENAME(TABLE_NAME)), COLUMN_NAME, 'IsIdentity') = 1 \
               THEN 1 ELSE 0 END AS BIT) AS has_default \
             FROM INFORMATION_SCHEMA.COLUMNS \
             WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {} \
             ORDER BY ORDINAL_POSITION",
            self.placeholder(schema),
            self.placeholder(name)
        );
        q
    }
}

/// Plain lookup from engine family to dialect.
pub fn dialect_for(engine: Engine) -> Arc<dyn Dialect> {
    match engine {
        Engine::Postgres => Arc::new(PostgresDialect),
        Engine::MySql => Arc::new(MySqlDialect),
        Engine::SqlServer => Arc::new(SqlServerDialect),
    }
}
