//! File system storage backend
//!
//! Implements DocumentStore with one JSON file per column (`<column>.json`)
//! holding both its documents and its overrides.
//!
//! ## Atomicity
//!
//! Writers are serialized by an async mutex and publish a new file by writing a
//! temporary sibling and renaming it over the old one. Readers never take the
//! lock: a rename is atomic, so a reader parses either the old or the new file
//! in full. The exposure window of a reload is that single rename.
//!
//! Each write stages into its own uniquely named sibling, so concurrent
//! processes never share a temp file. The load-modify-rename cycle is only
//! serialized within one process: a data directory must have a single
//! writing process at a time, or one process's update can be lost.

use super::state::ColumnState;
use super::{DocumentStore, StorageError};
use crate::models::{ColumnType, Document, Filter, Override};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// File system document store
pub struct FileSystemDocumentStore {
    base_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSystemDocumentStore {
    /// Create a new file system document store
    ///
    /// # Arguments
    ///
    /// * `base_path` - Directory holding one file per column; created on first write
    ///
    /// # Example
    ///
    /// ```rust
    /// use netconfig_sot::storage::filesystem::FileSystemDocumentStore;
    ///
    /// let store = FileSystemDocumentStore::new("/var/lib/sot");
    /// ```
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn column_path(&self, column: ColumnType) -> PathBuf {
        self.base_path.join(format!("{}.json", column))
    }

    fn staging_path(&self, column: ColumnType) -> PathBuf {
        self.base_path
            .join(format!(".{}.json.{}.tmp", column, Uuid::new_v4().simple()))
    }

    async fn load(&self, column: ColumnType) -> Result<ColumnState, StorageError> {
        let path = self.column_path(column);
        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ColumnState::default());
            }
            Err(e) => {
                return Err(StorageError::IoError(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        serde_json::from_slice(&content).map_err(|e| {
            StorageError::SerializationError(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    async fn save(&self, column: ColumnType, state: &ColumnState) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            StorageError::IoError(format!(
                "Failed to create directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let content = serde_json::to_vec_pretty(state)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        let path = self.column_path(column);
        let staging = self.staging_path(column);
        fs::write(&staging, content).await.map_err(|e| {
            StorageError::IoError(format!("Failed to write {}: {}", staging.display(), e))
        })?;
        if let Err(e) = fs::rename(&staging, &path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(StorageError::IoError(format!(
                "Failed to replace {}: {}",
                path.display(),
                e
            )));
        }

        debug!("Persisted column {} to {}", column, path.display());
        Ok(())
    }

    /// Load, modify and publish one column under the writer lock
    async fn update<T, F>(&self, column: ColumnType, apply: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut ColumnState) -> T + Send,
        T: Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut state = self.load(column).await?;
        let result = apply(&mut state);
        self.save(column, &state).await?;
        Ok(result)
    }
}

#[async_trait]
impl DocumentStore for FileSystemDocumentStore {
    async fn documents(
        &self,
        column: ColumnType,
        filter: &Filter,
    ) -> Result<Vec<Document>, StorageError> {
        Ok(self.load(column).await?.documents(filter))
    }

    async fn upsert_documents(
        &self,
        column: ColumnType,
        documents: Vec<Document>,
    ) -> Result<usize, StorageError> {
        self.update(column, |state| state.upsert_documents(documents))
            .await
    }

    async fn swap_datasource(
        &self,
        column: ColumnType,
        datasource: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StorageError> {
        self.update(column, |state| state.swap_datasource(datasource, documents))
            .await
    }

    async fn delete_documents(
        &self,
        column: ColumnType,
        filter: &Filter,
    ) -> Result<usize, StorageError> {
        self.update(column, |state| state.delete_documents(filter))
            .await
    }

    async fn overrides(
        &self,
        column: ColumnType,
        filter: &Filter,
    ) -> Result<Vec<Override>, StorageError> {
        Ok(self.load(column).await?.overrides(filter))
    }

    async fn upsert_override(&self, patch: Override) -> Result<(), StorageError> {
        self.update(patch.column, |state| state.upsert_override(patch))
            .await
    }

    async fn delete_overrides(
        &self,
        column: ColumnType,
        filter: &Filter,
    ) -> Result<usize, StorageError> {
        self.update(column, |state| state.delete_overrides(filter))
            .await
    }
}
