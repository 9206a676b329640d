//! Table reference, introspected columns, filters and records.

use crate::sql::ColumnKind;
use serde_json::Value;

/// One row in either direction. Key order follows the engine's column order.
pub type Record = serde_json::Map<String, Value>;

/// Target table. `schema: None` means the dialect's default schema.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: Option<&str>, name: &str) -> Self {
        TableRef {
            schema: schema.map(str::trim).filter(|s| !s.is_empty()).map(String::from),
            name: name.trim().to_string(),
        }
    }

    /// `schema.table` for messages; not for SQL.
    pub fn display_name(&self) -> String {
        match &self.schema {
            Some(s) => format!("{}.{}", s, self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    /// Catalog type name as reported by `information_schema` (lowercased).
    pub data_type: String,
    pub nullable: bool,
    /// Column has a DB default or identity/auto-increment.
    pub has_default: bool,
}

impl ColumnInfo {
    pub fn kind(&self) -> ColumnKind {
        ColumnKind::from_data_type(&self.data_type)
    }
}

/// Ordered column set for one table.
#[derive(Clone, Debug, Default)]
pub struct ColumnSet {
    columns: Vec<ColumnInfo>,
}

impl ColumnSet {
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        ColumnSet { columns }
    }

    pub fn get(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter()
    }
}

/// Single-column equality filter.
#[derive(Clone, Debug)]
pub struct Filter {
    pub key: String,
    pub value: Value,
}

impl Filter {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter {
            key: key.into(),
            value: value.into(),
        }
    }
}
