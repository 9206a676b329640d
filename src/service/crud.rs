//! CrudService: repository calls plus field hashing on write and credential checks.

use super::factory::RepositoryFactory;
use super::hasher::PasswordHasher;
use crate::config::Provider;
use crate::error::AppError;
use crate::table::{Filter, Record, TableRef};
use serde_json::Value;
use std::sync::Arc;

/// Inputs of a credential check. Field names pick the columns; values are the user's input.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    pub user_field: String,
    pub password_field: String,
    pub user_value: String,
    pub password: String,
}

pub struct CrudService {
    factory: RepositoryFactory,
    hasher: Arc<dyn PasswordHasher>,
}

impl CrudService {
    pub fn new(factory: RepositoryFactory, hasher: Arc<dyn PasswordHasher>) -> Self {
        CrudService { factory, hasher }
    }

    pub fn provider(&self) -> Provider {
        self.factory.provider()
    }

    pub async fn list(&self, table: &TableRef, limit: Option<u32>) -> Result<Vec<Record>, AppError> {
        self.factory.repository().list(table, limit).await
    }

    pub async fn find_by_key(&self, table: &TableRef, filter: &Filter) -> Result<Record, AppError> {
        self.factory.repository().find_by_key(table, filter).await
    }

    /// Validate, hash the named fields, then insert.
    pub async fn create(&self, table: &TableRef, mut record: Record, hash_fields: &[String]) -> Result<Record, AppError> {
        let repo = self.factory.repository();
        if !hash_fields.is_empty() {
            repo.validate_payload(table, &record).await?;
            self.hash_fields(&mut record, hash_fields).await?;
        }
        repo.create(table, record).await
    }

    /// Validate, hash the named fields, then apply a partial update.
    pub async fn update(
        &self,
        table: &TableRef,
        filter: &Filter,
        mut record: Record,
        hash_fields: &[String],
    ) -> Result<u64, AppError> {
        let repo = self.factory.repository();
        if !hash_fields.is_empty() {
            repo.validate_payload(table, &record).await?;
            self.hash_fields(&mut record, hash_fields).await?;
        }
        repo.update(table, filter, &record).await
    }

    pub async fn delete(&self, table: &TableRef, filter: &Filter) -> Result<u64, AppError> {
        self.factory.repository().delete(table, filter).await
    }

    /// Look the user up by `user_field = user_value` and check `password` against the stored hash.
    /// An absent user is NotFound; a missing, empty or malformed stored hash is `false`.
    /// All four inputs are required.
    pub async fn verify_credentials(&self, table: &TableRef, creds: &Credentials) -> Result<bool, AppError> {
        for (name, value) in [
            ("campo_usuario", &creds.user_field),
            ("campo_contrasena", &creds.password_field),
            ("valor_usuario", &creds.user_value),
            ("valor_contrasena", &creds.password),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{} is required", name)));
            }
        }
        let repo = self.factory.repository();
        let columns = repo.columns(table).await?;
        if !columns.contains(&creds.password_field) {
            return Err(AppError::Validation(format!(
                "unknown column '{}' for '{}'",
                creds.password_field,
                table.display_name()
            )));
        }
        let filter = Filter::new(creds.user_field.as_str(), creds.user_value.as_str());
        let row = repo.find_by_key(table, &filter).await?;
        let stored = match row.get(&creds.password_field) {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => return Ok(false),
        };
        self.hasher.verify(&creds.password, stored).await
    }

    /// Replace matching fields (case-insensitive) with their hash. Null and empty values stay as they are.
    async fn hash_fields(&self, record: &mut Record, fields: &[String]) -> Result<(), AppError> {
        if fields.is_empty() {
            return Ok(());
        }
        let wanted: Vec<String> = fields.iter().map(|f| f.to_lowercase()).collect();
        for (name, value) in record.iter_mut() {
            if !wanted.contains(&name.to_lowercase()) {
                continue;
            }
            let plaintext = match &*value {
                Value::Null => continue,
                Value::String(s) if s.is_empty() => continue,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            tracing::debug!(field = %name, "hashing field");
            *value = Value::String(self.hasher.hash(&plaintext).await?);
        }
        Ok(())
    }
}

/// Split a comma-separated field list such as `campos_encriptar=contrasena,pin`.
pub fn parse_field_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}
