//! Shared application state for all routes. Built once at startup, read-only afterwards.

use crate::config::Provider;
use crate::db::Executor;
use crate::service::{CrudService, PasswordHasher, RepositoryFactory};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CrudService>,
    /// Same executor the service uses; kept here for readiness pings.
    pub executor: Arc<dyn Executor>,
    pub environment: String,
}

impl AppState {
    pub fn new(
        provider: Provider,
        executor: Arc<dyn Executor>,
        hasher: Arc<dyn PasswordHasher>,
        max_limit: u32,
        environment: impl Into<String>,
    ) -> Self {
        let factory = RepositoryFactory::new(provider, executor.clone(), max_limit);
        AppState {
            service: Arc::new(CrudService::new(factory, hasher)),
            executor,
            environment: environment.into(),
        }
    }
}
