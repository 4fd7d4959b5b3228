//! Business logic services

pub mod catalog;
pub mod loans;

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::{error::AppResult, repository::Repository};

pub use catalog::CatalogService;

/// Catalog shared between tasks.
///
/// The lock is held for a whole operation, persistence included, so the
/// catalog invariants are only ever observed at operation boundaries:
///
/// ```ignore
/// catalog.lock().await.lend_book(isbn, "Alice").await?;
/// ```
#[derive(Clone)]
pub struct SharedCatalog {
    inner: Arc<Mutex<CatalogService>>,
}

impl SharedCatalog {
    pub fn new(service: CatalogService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    /// Load the catalog from `repository` and wrap it
    pub async fn load(repository: Repository) -> AppResult<Self> {
        Ok(Self::new(CatalogService::load(repository).await?))
    }

    pub async fn lock(&self) -> MutexGuard<'_, CatalogService> {
        self.inner.lock().await
    }
}
