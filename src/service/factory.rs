//! Provider → repository lookup. Built once at startup; holds no request state.

use crate::config::Provider;
use crate::db::Executor;
use crate::repository::GenericRepository;
use crate::sql::dialect_for;
use std::sync::Arc;

pub struct RepositoryFactory {
    provider: Provider,
    repository: Arc<GenericRepository>,
}

impl RepositoryFactory {
    /// Pair the provider's dialect with the shared executor.
    pub fn new(provider: Provider, executor: Arc<dyn Executor>, max_limit: u32) -> Self {
        let dialect = dialect_for(provider.engine());
        RepositoryFactory {
            provider,
            repository: Arc::new(GenericRepository::new(dialect, executor, max_limit)),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn repository(&self) -> Arc<GenericRepository> {
        self.repository.clone()
    }
}
