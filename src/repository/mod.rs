//! Generic repository: single-table, single-statement CRUD for any table the engine can describe.
//!
//! Every operation introspects the table once (cached for the process), validates the
//! request against that column set, then runs one parameterized statement built by the dialect.

mod validation;
pub use validation::PayloadValidator;

use crate::db::Executor;
use crate::error::AppError;
use crate::sql::{self, validate_identifier, BindValue, Dialect, Returning};
use crate::table::{ColumnSet, Filter, Record, TableRef};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub struct GenericRepository {
    dialect: Arc<dyn Dialect>,
    executor: Arc<dyn Executor>,
    columns: RwLock<HashMap<TableRef, Arc<ColumnSet>>>,
    max_limit: u32,
}

impl GenericRepository {
    pub fn new(dialect: Arc<dyn Dialect>, executor: Arc<dyn Executor>, max_limit: u32) -> Self {
        GenericRepository {
            dialect,
            executor,
            columns: RwLock::new(HashMap::new()),
            max_limit: max_limit.max(1),
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Introspected columns for `table`, from cache when possible.
    pub async fn columns(&self, table: &TableRef) -> Result<Arc<ColumnSet>, AppError> {
        validate_table(table)?;
        let cached = self
            .columns
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(table)
            .cloned();
        if let Some(set) = cached {
            return Ok(set);
        }
        tracing::debug!(table = %table.display_name(), "column cache miss");
        let set = Arc::new(self.dialect.list_columns(table, self.executor.as_ref()).await?);
        self.columns
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(table.clone(), set.clone());
        Ok(set)
    }

    /// Rows in engine order, at most `limit` (None or 0 means the configured maximum).
    pub async fn list(&self, table: &TableRef, limit: Option<u32>) -> Result<Vec<Record>, AppError> {
        // Confirms the table exists so a typo is a 404 rather than a driver error.
        let columns = self.columns(table).await?;
        let limit = match limit {
            Some(n) if n > 0 => n.min(self.max_limit),
            _ => self.max_limit,
        };
        let q = sql::select_list(self.dialect(), table, &columns, limit);
        self.executor.fetch_all(&q).await
    }

    /// First row where `filter.key = filter.value`. The key need not be unique.
    pub async fn find_by_key(&self, table: &TableRef, filter: &Filter) -> Result<Record, AppError> {
        let columns = self.columns(table).await?;
        let key = PayloadValidator::key_column(filter, &columns, table)?;
        let q = sql::select_by_key(self.dialect(), table, &columns, key, &filter.value)?;
        self.executor
            .fetch_all(&q)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(table, filter))
    }

    /// Check a create/update payload against the table's columns without touching rows.
    pub async fn validate_payload(&self, table: &TableRef, record: &Record) -> Result<Arc<ColumnSet>, AppError> {
        PayloadValidator::require_fields(record, table)?;
        let columns = self.columns(table).await?;
        PayloadValidator::validate(record, &columns, table)?;
        for (name, value) in record {
            if let Some(column) = columns.get(name) {
                BindValue::from_json(value, column.kind(), name)?;
            }
        }
        Ok(columns)
    }

    /// Insert one row. Returns the stored row where the engine can return it, else the input.
    pub async fn create(&self, table: &TableRef, record: Record) -> Result<Record, AppError> {
        let columns = self.validate_payload(table, &record).await?;
        let q = sql::insert(self.dialect(), table, &columns, &record)?;
        match self.dialect.returning() {
            Returning::Suffix | Returning::Output => {
                let row = self.executor.fetch_all(&q).await?.into_iter().next();
                Ok(row.unwrap_or(record))
            }
            Returning::None => {
                self.executor.execute(&q).await?;
                Ok(record)
            }
        }
    }

    /// Partial update of the rows matching `filter`. Returns the affected row count.
    pub async fn update(&self, table: &TableRef, filter: &Filter, record: &Record) -> Result<u64, AppError> {
        let columns = self.validate_payload(table, record).await?;
        let key = PayloadValidator::key_column(filter, &columns, table)?;
        let q = sql::update(self.dialect(), table, &columns, key, &filter.value, record)?;
        match self.executor.execute(&q).await? {
            0 => Err(not_found(table, filter)),
            n => Ok(n),
        }
    }

    /// Delete the rows matching `filter`. Returns the affected row count.
    pub async fn delete(&self, table: &TableRef, filter: &Filter) -> Result<u64, AppError> {
        let columns = self.columns(table).await?;
        let key = PayloadValidator::key_column(filter, &columns, table)?;
        let q = sql::delete(self.dialect(), table, key, &filter.value)?;
        match self.executor.execute(&q).await? {
            0 => Err(not_found(table, filter)),
            n => Ok(n),
        }
    }
}

fn validate_table(table: &TableRef) -> Result<(), AppError> {
    validate_identifier(&table.name, "table")?;
    if let Some(schema) = &table.schema {
        validate_identifier(schema, "schema")?;
    }
    Ok(())
}

fn not_found(table: &TableRef, filter: &Filter) -> AppError {
    let value = match &filter.value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    AppError::NotFound(format!(
        "no row in '{}' where {} = {}",
        table.display_name(),
        filter.key,
        value
    ))
}
