//! Repository layer: durable storage of the catalog datasets
//!
//! Each structure owned by the catalog core is stored as an independent named
//! dataset. The store only sees opaque JSON snapshots; [`Repository`] converts
//! between those snapshots and the typed in-memory structures.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, sync::Arc};

use crate::{
    error::{AppError, AppResult},
    models::{catalog::CatalogState, BookRecord},
};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Named datasets, in the order they are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Catalog,
    ByYear,
    BySubject,
    ByAuthor,
    Loans,
}

impl Dataset {
    pub const ALL: [Dataset; 5] = [
        Dataset::Catalog,
        Dataset::ByYear,
        Dataset::BySubject,
        Dataset::ByAuthor,
        Dataset::Loans,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Catalog => "catalog",
            Dataset::ByYear => "by_year",
            Dataset::BySubject => "by_subject",
            Dataset::ByAuthor => "by_author",
            Dataset::Loans => "loans",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of writing a batch of datasets
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub written: Vec<Dataset>,
    pub failures: Vec<(Dataset, String)>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// `PersistenceFailed` when nothing was written, `PersistencePartial` otherwise
    pub fn into_result(self) -> AppResult<()> {
        if self.failures.is_empty() {
            return Ok(());
        }
        for (dataset, reason) in &self.failures {
            tracing::warn!("Dataset {} not persisted: {}", dataset, reason);
        }
        let failed: Vec<Dataset> = self.failures.iter().map(|(d, _)| *d).collect();
        if self.written.is_empty() {
            let reason = self
                .failures
                .into_iter()
                .map(|(_, reason)| reason)
                .next()
                .unwrap_or_default();
            return Err(AppError::PersistenceFailed { failed, reason });
        }
        Err(AppError::PersistencePartial {
            written: self.written,
            failed,
        })
    }
}

/// Durable storage for named dataset snapshots
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Replace the stored snapshot of `dataset`
    async fn save(&self, dataset: Dataset, snapshot: &Value) -> AppResult<()>;

    /// Stored snapshot of `dataset`, `None` if it was never saved
    async fn load(&self, dataset: Dataset) -> AppResult<Option<Value>>;

    /// Write every snapshot as one logical batch.
    ///
    /// The default writes in order and stops at the first failure; the
    /// datasets left unwritten are reported as failed too.
    async fn save_all(&self, batch: &[(Dataset, Value)]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let mut remaining = batch.iter();
        for (dataset, snapshot) in remaining.by_ref() {
            match self.save(*dataset, snapshot).await {
                Ok(()) => outcome.written.push(*dataset),
                Err(e) => {
                    outcome.failures.push((*dataset, e.to_string()));
                    break;
                }
            }
        }
        for (dataset, _) in remaining {
            outcome.failures.push((*dataset, "not attempted".to_string()));
        }
        outcome
    }
}

/// Typed access to the catalog datasets
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DatasetStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn DatasetStore>) -> Self {
        Self { store }
    }

    /// Repository over a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn DatasetStore> {
        &self.store
    }

    /// Persist every structure of `state` in one batch
    pub async fn save_state(&self, state: &CatalogState) -> AppResult<()> {
        let records: Vec<&BookRecord> = state.books().values().collect();
        let batch = vec![
            (Dataset::Catalog, serde_json::to_value(records)?),
            (Dataset::ByYear, serde_json::to_value(state.by_year())?),
            (Dataset::BySubject, serde_json::to_value(state.by_subject())?),
            (Dataset::ByAuthor, serde_json::to_value(state.by_author())?),
            (Dataset::Loans, serde_json::to_value(state.loans())?),
        ];
        self.store.save_all(&batch).await.into_result()
    }

    /// Load every dataset; missing datasets are empty
    pub async fn load_state(&self) -> AppResult<CatalogState> {
        CatalogState::from_parts(
            self.load_dataset(Dataset::Catalog).await?.unwrap_or_default(),
            self.load_dataset(Dataset::ByYear).await?.unwrap_or_default(),
            self.load_dataset(Dataset::BySubject).await?.unwrap_or_default(),
            self.load_dataset(Dataset::ByAuthor).await?.unwrap_or_default(),
            self.load_dataset(Dataset::Loans).await?.unwrap_or_default(),
        )
    }

    async fn load_dataset<T: DeserializeOwned>(&self, dataset: Dataset) -> AppResult<Option<T>> {
        match self.store.load(dataset).await? {
            Some(snapshot) => {
                let value = serde_json::from_value(snapshot).map_err(|e| {
                    AppError::InvalidState(format!("dataset {} is malformed: {}", dataset, e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}
