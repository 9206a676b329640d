//! HTTP scenarios against an in-memory executor that understands the PostgreSQL statements
//! the builders emit. Covers routing, status codes, envelopes, hashing and verification.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tabla_crud::sql::{BindValue, QueryBuf};
use tabla_crud::{app, AppError, AppState, BcryptHasher, Executor, Provider, Record};
use tower::ServiceExt;

struct MemTable {
    columns: Vec<(&'static str, &'static str, bool)>,
    rows: Vec<Record>,
}

#[derive(Default)]
struct MemoryDb {
    tables: Mutex<HashMap<String, MemTable>>,
}

impl MemoryDb {
    fn with_table(self, name: &str, columns: Vec<(&'static str, &'static str, bool)>) -> Self {
        self.tables.lock().unwrap().insert(
            name.to_string(),
            MemTable {
                columns,
                rows: Vec::new(),
            },
        );
        self
    }
}

fn to_json(p: &BindValue) -> Value {
    match p {
        BindValue::Null(_) => Value::Null,
        BindValue::Bool(b) => json!(b),
        BindValue::I64(n) => json!(n),
        BindValue::F64(n) => json!(n),
        BindValue::Decimal(d) if d.fract().is_zero() => json!(d.to_i64().unwrap()),
        BindValue::Decimal(d) => json!(d.to_f64().unwrap()),
        BindValue::Text(s) => json!(s),
        BindValue::Uuid(u) => json!(u.to_string()),
        BindValue::Date(d) => json!(d.to_string()),
        BindValue::Timestamp(d) => json!(d.to_string()),
        BindValue::TimestampTz(d) => json!(d.to_rfc3339()),
        BindValue::Time(t) => json!(t.to_string()),
        BindValue::Json(j) => j.clone(),
    }
}

/// Text between the first `open` and the following `close`.
fn between<'a>(s: &'a str, open: &str, close: &str) -> &'a str {
    let start = s.find(open).unwrap() + open.len();
    let end = s[start..].find(close).unwrap() + start;
    &s[start..end]
}

fn table_of(sql: &str) -> String {
    between(sql, "\"public\".\"", "\"").to_string()
}

fn where_column(sql: &str) -> String {
    between(sql, " WHERE \"", "\"").to_string()
}

#[async_trait]
impl Executor for MemoryDb {
    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Record>, AppError> {
        let mut tables = self.tables.lock().unwrap();
        if q.sql == "SELECT 1" {
            return Ok(vec![json!({"?column?": 1}).as_object().cloned().unwrap()]);
        }
        if q.sql.contains("information_schema") {
            let name = to_json(&q.params[1]);
            let Some(t) = tables.get(name.as_str().unwrap()) else {
                return Ok(Vec::new());
            };
            return Ok(t
                .columns
                .iter()
                .map(|(c, ty, has_default)| {
                    json!({"column_name": c, "data_type": ty, "nullable": true, "has_default": has_default})
                        .as_object()
                        .cloned()
                        .unwrap()
                })
                .collect());
        }
        let t = tables.get_mut(&table_of(&q.sql)).unwrap();
        if q.sql.starts_with("SELECT * FROM") {
            if q.sql.contains(" WHERE ") {
                let col = where_column(&q.sql);
                let v = to_json(&q.params[0]);
                return Ok(t.rows.iter().filter(|r| r.get(&col) == Some(&v)).cloned().collect());
            }
            let limit: usize = q.sql.rsplit(' ').next().unwrap().parse().unwrap();
            return Ok(t.rows.iter().take(limit).cloned().collect());
        }
        if q.sql.starts_with("INSERT INTO") {
            let names: Vec<String> = between(&q.sql, "\" (", ")")
                .split(", ")
                .map(|c| c.trim_matches('"').to_string())
                .collect();
            let mut row = Record::new();
            for (c, _, has_default) in &t.columns {
                let supplied = names.iter().position(|n| n == c).map(|i| to_json(&q.params[i]));
                let v = match supplied {
                    Some(v) => v,
                    None if *has_default => json!(t.rows.len() + 1),
                    None => Value::Null,
                };
                row.insert(c.to_string(), v);
            }
            t.rows.push(row.clone());
            return Ok(vec![row]);
        }
        panic!("unexpected statement: {}", q.sql);
    }

    async fn execute(&self, q: &QueryBuf) -> Result<u64, AppError> {
        let mut tables = self.tables.lock().unwrap();
        let t = tables.get_mut(&table_of(&q.sql)).unwrap();
        let col = where_column(&q.sql);
        let key = to_json(q.params.last().unwrap());
        if q.sql.starts_with("UPDATE") {
            let sets: Vec<String> = between(&q.sql, " SET ", " WHERE ")
                .split(", ")
                .map(|s| s.split(" = ").next().unwrap().trim_matches('"').to_string())
                .collect();
            let mut n = 0;
            for row in t.rows.iter_mut().filter(|r| r.get(&col) == Some(&key)) {
                for (i, c) in sets.iter().enumerate() {
                    row.insert(c.clone(), to_json(&q.params[i]));
                }
                n += 1;
            }
            return Ok(n);
        }
        if q.sql.starts_with("DELETE FROM") {
            let before = t.rows.len();
            t.rows.retain(|r| r.get(&col) != Some(&key));
            return Ok((before - t.rows.len()) as u64);
        }
        panic!("unexpected statement: {}", q.sql);
    }
}

fn test_app() -> (Router, Arc<MemoryDb>) {
    let db = Arc::new(
        MemoryDb::default()
            .with_table(
                "producto",
                vec![
                    ("codigo", "character varying", false),
                    ("nombre", "character varying", false),
                    ("stock", "integer", false),
                    ("valorunitario", "numeric", false),
                ],
            )
            .with_table(
                "usuario",
                vec![
                    ("id", "integer", true),
                    ("email", "character varying", false),
                    ("contrasena", "character varying", false),
                ],
            ),
    );
    let state = AppState::new(Provider::Postgres, db.clone(), Arc::new(BcryptHasher::new(4)), 1000, "test");
    (app(state), db)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_producto_lifecycle() {
    let (app, _) = test_app();
    let input = json!({"codigo": "PR999", "nombre": "Laptop HP", "stock": 25, "valorunitario": 1500000});

    let (status, body) = send(&app, "POST", "/api/producto", Some(input.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"], input);

    let (status, body) = send(&app, "GET", "/api/producto/codigo/PR999", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nombre"], "Laptop HP");

    let (status, body) = send(&app, "PUT", "/api/producto/codigo/PR999", Some(json!({"stock": 30}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rows_affected"], 1);

    let (_, body) = send(&app, "GET", "/api/producto/codigo/PR999", None).await;
    assert_eq!(body["data"]["stock"], 30);
    assert_eq!(body["data"]["nombre"], "Laptop HP");

    let (status, body) = send(&app, "DELETE", "/api/producto/codigo/PR999", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rows_affected"], 1);

    let (status, body) = send(&app, "GET", "/api/producto/codigo/PR999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_missing_rows_are_404_without_side_effects() {
    let (app, db) = test_app();
    send(&app, "POST", "/api/producto", Some(json!({"codigo": "A1", "stock": 1}))).await;

    let (status, _) = send(&app, "PUT", "/api/producto/codigo/ZZ", Some(json!({"stock": 9}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", "/api/producto/codigo/ZZ", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let tables = db.tables.lock().unwrap();
    let rows = &tables["producto"].rows;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["stock"], 1);
}

#[tokio::test]
async fn test_list_respects_limite() {
    let (app, _) = test_app();
    for i in 0..3 {
        send(&app, "POST", "/api/producto", Some(json!({"codigo": format!("P{}", i), "stock": i}))).await;
    }
    let (status, body) = send(&app, "GET", "/api/producto?limite=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["count"], 2);

    let (_, body) = send(&app, "GET", "/api/producto", None).await;
    assert_eq!(body["meta"]["count"], 3);

    let (status, body) = send(&app, "GET", "/api/producto?limite=diez", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_validation_errors() {
    let (app, _) = test_app();
    let (status, body) = send(&app, "POST", "/api/producto", Some(json!({"codigo": "X", "color": "rojo"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("color"));

    let (status, _) = send(&app, "PUT", "/api/producto/codigo/X", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/api/producto/color/rojo", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/api/fantasma", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/api/producto%3B%20DROP", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_values_the_column_cannot_hold_are_400() {
    let (app, db) = test_app();
    let (status, body) = send(&app, "GET", "/api/producto/stock/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert!(body["error"]["message"].as_str().unwrap().contains("column stock"));

    let (status, _) = send(&app, "DELETE", "/api/producto/stock/1.5", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/producto", Some(json!({"codigo": "X", "stock": 2.7}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, "POST", "/api/producto", Some(json!({"codigo": "X", "stock": "x1"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(db.tables.lock().unwrap()["producto"].rows.is_empty());
}

#[tokio::test]
async fn test_usuario_password_hashing_and_verification() {
    let (app, db) = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/usuario?campos_encriptar=contrasena",
        Some(json!({"email": "a@b.com", "contrasena": "123456"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let stored = body["data"]["contrasena"].as_str().unwrap().to_string();
    assert_ne!(stored, "123456");
    assert!(stored.starts_with("$2"));
    assert_eq!(db.tables.lock().unwrap()["usuario"].rows[0]["contrasena"], json!(stored));

    let creds = |password: &str| {
        json!({
            "campo_usuario": "email",
            "campo_contrasena": "contrasena",
            "valor_usuario": "a@b.com",
            "valor_contrasena": password,
        })
    };
    let (status, body) = send(&app, "POST", "/api/usuario/verificar-contrasena", Some(creds("123456"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], true);

    let (_, body) = send(&app, "POST", "/api/usuario/verificar-contrasena", Some(creds("wrong"))).await;
    assert_eq!(body["data"]["valid"], false);

    let (status, body) = send(&app, "POST", "/api/usuario/verificar-contrasena", Some(creds(""))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("valor_contrasena"));

    let (status, _) = send(
        &app,
        "POST",
        "/api/usuario/verificar-contrasena?campo_usuario=email&campo_contrasena=contrasena",
        Some(json!({"valor_usuario": "nadie@b.com", "valor_contrasena": "123456"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_password_in_query_string_is_rejected() {
    let (app, _) = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/usuario/verificar-contrasena?campo_usuario=email&campo_contrasena=contrasena&valor_usuario=a@b.com&valor_contrasena=123456",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("valor_contrasena"));
}

#[tokio::test]
async fn test_diagnostics_routes() {
    let (app, _) = test_app();
    let (status, body) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["environment"], "test");
    assert_eq!(body["provider"], "postgres");

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");
}
