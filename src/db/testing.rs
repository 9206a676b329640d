//! Scripted executor for unit tests.

use super::Executor;
use crate::error::AppError;
use crate::sql::QueryBuf;
use crate::table::Record;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Answers catalog queries from a fixed column list and everything else from a script.
pub(crate) struct FakeExecutor {
    catalog: Vec<Record>,
    rows: Mutex<VecDeque<Vec<Record>>>,
    affected: Mutex<VecDeque<u64>>,
    log: Mutex<Vec<QueryBuf>>,
}

impl FakeExecutor {
    pub(crate) fn new(columns: &[(&str, &str)]) -> Self {
        let catalog = columns
            .iter()
            .map(|(name, ty)| {
                json!({"column_name": name, "data_type": ty, "nullable": true, "has_default": false})
                    .as_object()
                    .cloned()
                    .unwrap()
            })
            .collect();
        FakeExecutor {
            catalog,
            rows: Mutex::new(VecDeque::new()),
            affected: Mutex::new(VecDeque::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_rows(self, rows: Vec<Value>) -> Self {
        let rows = rows.into_iter().map(|r| r.as_object().cloned().unwrap()).collect();
        self.rows.lock().unwrap().push_back(rows);
        self
    }

    pub(crate) fn with_affected(self, n: u64) -> Self {
        self.affected.lock().unwrap().push_back(n);
        self
    }

    pub(crate) fn statements(&self) -> Vec<QueryBuf> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn catalog_hits(&self) -> usize {
        self.statements()
            .iter()
            .filter(|q| is_catalog(q))
            .count()
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Record>, AppError> {
        self.log.lock().unwrap().push(q.clone());
        if is_catalog(q) {
            return Ok(self.catalog.clone());
        }
        Ok(self.rows.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn execute(&self, q: &QueryBuf) -> Result<u64, AppError> {
        self.log.lock().unwrap().push(q.clone());
        Ok(self.affected.lock().unwrap().pop_front().unwrap_or(0))
    }
}

pub(crate) fn is_catalog(q: &QueryBuf) -> bool {
    q.sql.to_lowercase().contains("information_schema")
}
