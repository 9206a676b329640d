//! Connection provider: one pooled handle for the active engine, shared by every request.

mod mssql;
mod mysql;
mod postgres;
#[cfg(test)]
pub(crate) mod testing;

use crate::config::{Engine, Settings};
use crate::error::AppError;
use crate::sql::QueryBuf;
use crate::table::Record;
use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::postgres::{PgPool, PgPoolOptions};

pub use mssql::SqlServerPool;

/// Runs built statements. Implemented by `Connection`; tests substitute fakes.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a row-returning statement; rows come back as column-ordered records.
    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Record>, AppError>;

    /// Run a statement and return the affected row count.
    async fn execute(&self, q: &QueryBuf) -> Result<u64, AppError>;

    /// `SELECT 1` round trip, for readiness checks.
    async fn ping(&self) -> Result<(), AppError> {
        let mut q = QueryBuf::new();
        q.sql.push_str("SELECT 1");
        self.fetch_all(&q).await.map(|_| ())
    }
}

/// Pooled engine handle. Lives for the process; callers borrow it per statement.
#[derive(Clone)]
pub enum Connection {
    Postgres(PgPool),
    MySql(MySqlPool),
    SqlServer(SqlServerPool),
}

impl Connection {
    /// Build the pool for the configured provider. Pool size and acquire timeout come from settings.
    pub async fn connect(settings: &Settings) -> Result<Self, AppError> {
        let engine = settings.provider.engine();
        tracing::info!(
            provider = %settings.provider,
            ?engine,
            max_connections = settings.max_connections,
            "creating connection pool"
        );
        let conn = match engine {
            Engine::Postgres => Connection::Postgres(
                PgPoolOptions::new()
                    .max_connections(settings.max_connections)
                    .acquire_timeout(settings.acquire_timeout)
                    .connect(&settings.connection_string)
                    .await?,
            ),
            Engine::MySql => Connection::MySql(
                MySqlPoolOptions::new()
                    .max_connections(settings.max_connections)
                    .acquire_timeout(settings.acquire_timeout)
                    .connect(&settings.connection_string)
                    .await?,
            ),
            Engine::SqlServer => Connection::SqlServer(mssql::connect(settings).await?),
        };
        Ok(conn)
    }

    pub fn engine(&self) -> Engine {
        match self {
            Connection::Postgres(_) => Engine::Postgres,
            Connection::MySql(_) => Engine::MySql,
            Connection::SqlServer(_) => Engine::SqlServer,
        }
    }
}

#[async_trait]
impl Executor for Connection {
    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Record>, AppError> {
        tracing::debug!(sql = %q.sql, params = q.params.len(), "query");
        match self {
            Connection::Postgres(pool) => postgres::fetch_all(pool, q).await,
            Connection::MySql(pool) => mysql::fetch_all(pool, q).await,
            Connection::SqlServer(pool) => mssql::fetch_all(pool, q).await,
        }
    }

    async fn execute(&self, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = q.params.len(), "execute");
        match self {
            Connection::Postgres(pool) => postgres::execute(pool, q).await,
            Connection::MySql(pool) => mysql::execute(pool, q).await,
            Connection::SqlServer(pool) => mssql::execute(pool, q).await,
        }
    }
}

/// Decimal result cells are reported as JSON numbers; whole values stay integers.
fn decimal_to_json(d: rust_decimal::Decimal) -> serde_json::Value {
    use rust_decimal::prelude::ToPrimitive;
    if d.fract().is_zero() {
        if let Some(n) = d.to_i64() {
            return serde_json::Value::Number(n.into());
        }
    }
    d.to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
        .unwrap_or_else(|| serde_json::Value::String(d.to_string()))
}

fn f64_to_json(f: f64) -> serde_json::Value {
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn naive_datetime_to_json(d: chrono::NaiveDateTime) -> serde_json::Value {
    serde_json::Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}
