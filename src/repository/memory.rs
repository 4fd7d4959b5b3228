//! In-memory dataset store for tests and ephemeral catalogs

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::AppResult;

use super::{Dataset, DatasetStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    datasets: RwLock<HashMap<Dataset, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the datasets saved so far
    pub async fn saved(&self) -> Vec<Dataset> {
        let mut names: Vec<Dataset> = self.datasets.read().await.keys().copied().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl DatasetStore for MemoryStore {
    async fn save(&self, dataset: Dataset, snapshot: &Value) -> AppResult<()> {
        self.datasets.write().await.insert(dataset, snapshot.clone());
        Ok(())
    }

    async fn load(&self, dataset: Dataset) -> AppResult<Option<Value>> {
        Ok(self.datasets.read().await.get(&dataset).cloned())
    }
}
