//! HTTP handlers for table CRUD and credential checks.

pub mod entity;
pub use entity::*;
