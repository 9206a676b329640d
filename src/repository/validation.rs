//! Payload and filter checks against the introspected column set.

use crate::error::AppError;
use crate::sql::ColumnKind;
use crate::table::{ColumnInfo, ColumnSet, Filter, Record, TableRef};
use serde_json::Value;

pub struct PayloadValidator;

impl PayloadValidator {
    /// Reject an empty payload. Runs before any catalog or table access.
    pub fn require_fields(record: &Record, table: &TableRef) -> Result<(), AppError> {
        if record.is_empty() {
            return Err(AppError::Validation(format!(
                "payload for '{}' must contain at least one field",
                table.display_name()
            )));
        }
        Ok(())
    }

    /// Every field must be a real column, and values must fit the column's shape.
    pub fn validate(record: &Record, columns: &ColumnSet, table: &TableRef) -> Result<(), AppError> {
        let unknown: Vec<&str> = record
            .keys()
            .filter(|k| !columns.contains(k))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(AppError::Validation(format!(
                "unknown fields for '{}': {}",
                table.display_name(),
                unknown.join(", ")
            )));
        }
        for (name, v) in record {
            if let Some(col) = columns.get(name) {
                validate_field(col, v)?;
            }
        }
        Ok(())
    }

    /// Resolve the filter column. The value must be present and non-blank.
    pub fn key_column<'a>(filter: &Filter, columns: &'a ColumnSet, table: &TableRef) -> Result<&'a ColumnInfo, AppError> {
        let blank = match &filter.value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        };
        if blank {
            return Err(AppError::validation("filter value must not be empty"));
        }
        columns.get(&filter.key).ok_or_else(|| {
            AppError::Validation(format!(
                "unknown filter column '{}' for '{}'",
                filter.key,
                table.display_name()
            ))
        })
    }
}

fn validate_field(col: &ColumnInfo, v: &Value) -> Result<(), AppError> {
    match v {
        Value::Null if !col.nullable => Err(AppError::Validation(format!("{} cannot be null", col.name))),
        Value::Object(_) | Value::Array(_) if col.kind() != ColumnKind::Json => {
            Err(AppError::Validation(format!("{} must be a scalar value", col.name)))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns() -> ColumnSet {
        ColumnSet::new(vec![
            ColumnInfo {
                name: "codigo".into(),
                data_type: "varchar".into(),
                nullable: false,
                has_default: false,
            },
            ColumnInfo {
                name: "detalle".into(),
                data_type: "jsonb".into(),
                nullable: true,
                has_default: false,
            },
        ])
    }

    fn table() -> TableRef {
        TableRef::new(None, "producto")
    }

    #[test]
    fn test_unknown_fields_are_listed() {
        let rec = json!({"codigo": "PR1", "precio": 1, "color": "rojo"}).as_object().cloned().unwrap();
        let err = PayloadValidator::validate(&rec, &columns(), &table()).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(msg.contains("precio") && msg.contains("color"));
        assert!(!msg.contains("codigo,"));
    }

    #[test]
    fn test_nested_values_only_for_json_columns() {
        let ok = json!({"detalle": {"a": 1}}).as_object().cloned().unwrap();
        assert!(PayloadValidator::validate(&ok, &columns(), &table()).is_ok());
        let bad = json!({"codigo": ["x"]}).as_object().cloned().unwrap();
        assert!(PayloadValidator::validate(&bad, &columns(), &table()).is_err());
    }

    #[test]
    fn test_null_into_not_null_column() {
        let rec = json!({"codigo": null}).as_object().cloned().unwrap();
        let err = PayloadValidator::validate(&rec, &columns(), &table()).unwrap_err();
        assert!(err.to_string().contains("codigo cannot be null"));
    }

    #[test]
    fn test_key_column_rules() {
        let cols = columns();
        assert!(PayloadValidator::key_column(&Filter::new("codigo", "PR1"), &cols, &table()).is_ok());
        assert!(PayloadValidator::key_column(&Filter::new("codigo", "  "), &cols, &table()).is_err());
        let err = PayloadValidator::key_column(&Filter::new("nope", "x"), &cols, &table()).unwrap_err();
        assert!(err.to_string().contains("unknown filter column 'nope'"));
    }

    #[test]
    fn test_empty_payload() {
        assert!(PayloadValidator::require_fields(&Record::new(), &table()).is_err());
    }
}
