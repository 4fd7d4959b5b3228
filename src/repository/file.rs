//! File-backed dataset store: one JSON document per dataset

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};

use crate::error::AppResult;

use super::{BatchOutcome, Dataset, DatasetStore};

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    pretty: bool,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl AsRef<Path>, pretty: bool) -> AppResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        tracing::debug!("Dataset store opened at {}", root.display());
        Ok(Self { root, pretty })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, dataset: Dataset) -> PathBuf {
        self.root.join(format!("{}.json", dataset))
    }

    fn staging_path(&self, dataset: Dataset) -> PathBuf {
        self.root.join(format!("{}.json.tmp", dataset))
    }

    fn encode(&self, snapshot: &Value) -> AppResult<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(snapshot)?
        } else {
            serde_json::to_vec(snapshot)?
        };
        Ok(bytes)
    }

    /// Write `snapshot` next to its final location and fsync it
    async fn stage(&self, dataset: Dataset, snapshot: &Value) -> AppResult<PathBuf> {
        let bytes = self.encode(snapshot)?;
        let tmp_path = self.staging_path(dataset);
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        Ok(tmp_path)
    }

    async fn discard(paths: &[(Dataset, PathBuf)]) {
        for (_, path) in paths {
            if let Err(e) = fs::remove_file(path).await {
                tracing::debug!("Could not remove staged file {}: {}", path.display(), e);
            }
        }
    }
}

#[async_trait]
impl DatasetStore for FileStore {
    async fn save(&self, dataset: Dataset, snapshot: &Value) -> AppResult<()> {
        let tmp_path = self.stage(dataset, snapshot).await?;
        fs::rename(&tmp_path, self.path_for(dataset)).await?;
        Ok(())
    }

    async fn load(&self, dataset: Dataset) -> AppResult<Option<Value>> {
        match fs::read(self.path_for(dataset)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Stage every dataset first; nothing is renamed into place unless all
    /// staging writes succeeded. Only a failing rename can leave a partial batch,
    /// and the staged files it did not reach are removed.
    async fn save_all(&self, batch: &[(Dataset, Value)]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let mut staged = Vec::with_capacity(batch.len());

        for (dataset, snapshot) in batch {
            match self.stage(*dataset, snapshot).await {
                Ok(path) => staged.push((*dataset, path)),
                Err(e) => {
                    Self::discard(&staged).await;
                    outcome.failures = batch
                        .iter()
                        .map(|(d, _)| {
                            let reason = if d == dataset { e.to_string() } else { "batch aborted".to_string() };
                            (*d, reason)
                        })
                        .collect();
                    return outcome;
                }
            }
        }

        for (i, (dataset, tmp_path)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(tmp_path, self.path_for(*dataset)).await {
                let rest = &staged[i..];
                Self::discard(rest).await;
                outcome.failures.push((*dataset, e.to_string()));
                outcome
                    .failures
                    .extend(rest[1..].iter().map(|(d, _)| (*d, "batch aborted".to_string())));
                break;
            }
            outcome.written.push(*dataset);
        }
        if !outcome.is_complete() {
            tracing::warn!(
                "Dataset batch in {} partially applied: {} written, {} failed",
                self.root.display(),
                outcome.written.len(),
                outcome.failures.len()
            );
        }
        outcome
    }
}
