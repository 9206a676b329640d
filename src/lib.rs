//! Tabla CRUD: a table-agnostic REST layer over SQL Server, PostgreSQL and MySQL.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod table;

pub use config::{load_env_files, Engine, Provider, Settings};
pub use db::{Connection, Executor};
pub use error::{AppError, ConfigError};
pub use repository::GenericRepository;
pub use response::{success_many, success_one, success_one_ok};
pub use routes::{app, common_routes_with_ready, entity_routes};
pub use service::{BcryptHasher, CrudService, Credentials, PasswordHasher, RepositoryFactory};
pub use state::AppState;
pub use table::{ColumnInfo, ColumnSet, Filter, Record, TableRef};
