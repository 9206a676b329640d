//! Table CRUD handlers: list, read, create, update, delete, credential check.

use crate::error::AppError;
use crate::response::{success_many, success_one, success_one_ok, RowsAffected, Verification};
use crate::service::{parse_field_list, Credentials};
use crate::state::AppState;
use crate::table::{Filter, Record, TableRef};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

/// Query parameters shared by the table routes.
#[derive(Debug, Default, Deserialize)]
pub struct TableParams {
    pub esquema: Option<String>,
    pub limite: Option<String>,
    pub campos_encriptar: Option<String>,
}

/// Field names may come from the query string; the password value may not.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    pub esquema: Option<String>,
    pub campo_usuario: Option<String>,
    pub campo_contrasena: Option<String>,
    pub valor_usuario: Option<String>,
    pub valor_contrasena: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyBody {
    pub campo_usuario: Option<String>,
    pub campo_contrasena: Option<String>,
    pub valor_usuario: Option<String>,
    pub valor_contrasena: Option<String>,
}

fn table_ref(table: &str, schema: Option<&str>) -> Result<TableRef, AppError> {
    if table.trim().is_empty() {
        return Err(AppError::validation("table name is required"));
    }
    Ok(TableRef::new(schema, table))
}

fn key_filter(key: String, value: String) -> Result<Filter, AppError> {
    if key.trim().is_empty() {
        return Err(AppError::validation("key column is required"));
    }
    if value.trim().is_empty() {
        return Err(AppError::validation("key value is required"));
    }
    Ok(Filter::new(key, value))
}

/// Non-positive means "use the default"; anything non-numeric is rejected.
fn parse_limit(raw: Option<&str>) -> Result<Option<u32>, AppError> {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let n: i64 = s
        .parse()
        .map_err(|_| AppError::Validation(format!("limite must be an integer, got '{}'", s)))?;
    if n <= 0 {
        return Ok(None);
    }
    Ok(Some(u32::try_from(n).unwrap_or(u32::MAX)))
}

fn body_to_record(value: Value) -> Result<Record, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::validation("body must be a JSON object")),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<TableParams>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let table = table_ref(&table, params.esquema.as_deref())?;
    let limit = parse_limit(params.limite.as_deref())?;
    let rows = state.service.list(&table, limit).await?;
    Ok(success_many(rows))
}

pub async fn read(
    State(state): State<AppState>,
    Path((table, key, value)): Path<(String, String, String)>,
    Query(params): Query<TableParams>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let table = table_ref(&table, params.esquema.as_deref())?;
    let filter = key_filter(key, value)?;
    let row = state.service.find_by_key(&table, &filter).await?;
    Ok(success_one_ok(row))
}

pub async fn create(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<TableParams>,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let table = table_ref(&table, params.esquema.as_deref())?;
    let record = body_to_record(body)?;
    let hash_fields = parse_field_list(params.campos_encriptar.as_deref());
    let row = state.service.create(&table, record, &hash_fields).await?;
    Ok(success_one(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path((table, key, value)): Path<(String, String, String)>,
    Query(params): Query<TableParams>,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let table = table_ref(&table, params.esquema.as_deref())?;
    let filter = key_filter(key, value)?;
    let record = body_to_record(body)?;
    let hash_fields = parse_field_list(params.campos_encriptar.as_deref());
    let rows_affected = state.service.update(&table, &filter, record, &hash_fields).await?;
    Ok(success_one_ok(RowsAffected { rows_affected }))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((table, key, value)): Path<(String, String, String)>,
    Query(params): Query<TableParams>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let table = table_ref(&table, params.esquema.as_deref())?;
    let filter = key_filter(key, value)?;
    let rows_affected = state.service.delete(&table, &filter).await?;
    Ok(success_one_ok(RowsAffected { rows_affected }))
}

pub async fn verify_password(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<VerifyParams>,
    body: Option<Json<VerifyBody>>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    if params.valor_contrasena.is_some() {
        return Err(AppError::validation(
            "valor_contrasena must be sent in the request body, not the query string",
        ));
    }
    let table = table_ref(&table, params.esquema.as_deref())?;
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let creds = Credentials {
        user_field: body.campo_usuario.or(params.campo_usuario).unwrap_or_default(),
        password_field: body.campo_contrasena.or(params.campo_contrasena).unwrap_or_default(),
        user_value: body.valor_usuario.or(params.valor_usuario).unwrap_or_default(),
        password: body.valor_contrasena.unwrap_or_default(),
    };
    let valid = state.service.verify_credentials(&table, &creds).await?;
    Ok(success_one_ok(Verification { valid }))
}
