//! Storage backend abstraction
//!
//! Defines the DocumentStore trait and implementations for different storage systems:
//! - MemoryDocumentStore: process-local store (tests, embedding)
//! - FileSystemDocumentStore: one JSON file per column (native apps, CLI)

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{StorageBackendKind, StorageSettings};
use crate::models::{ColumnType, Document, Filter, Override};

mod state;

pub mod memory;
pub use memory::MemoryDocumentStore;

#[cfg(feature = "native-fs")]
pub mod filesystem;
#[cfg(feature = "native-fs")]
pub use filesystem::FileSystemDocumentStore;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Trait for document stores
///
/// Documents are keyed by `(coordinate, datasource)` within a column and
/// overrides by coordinate. Every method is a single atomic operation from the
/// point of view of concurrent callers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents of `column` matching `filter`
    async fn documents(
        &self,
        column: ColumnType,
        filter: &Filter,
    ) -> Result<Vec<Document>, StorageError>;

    /// Insert documents, replacing any stored document with the same
    /// coordinate and datasource. Returns the number of documents written.
    async fn upsert_documents(
        &self,
        column: ColumnType,
        documents: Vec<Document>,
    ) -> Result<usize, StorageError>;

    /// Atomically replace every document of `datasource` in `column` with
    /// `documents`. Readers observe either the old or the new set, never a mix.
    /// Returns the number of documents removed.
    async fn swap_datasource(
        &self,
        column: ColumnType,
        datasource: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StorageError>;

    /// Delete documents matching `filter`; returns the number deleted
    async fn delete_documents(
        &self,
        column: ColumnType,
        filter: &Filter,
    ) -> Result<usize, StorageError>;

    /// Overrides of `column` whose coordinate matches `filter`
    async fn overrides(
        &self,
        column: ColumnType,
        filter: &Filter,
    ) -> Result<Vec<Override>, StorageError>;

    /// Store an override, replacing one at the same coordinate
    async fn upsert_override(&self, patch: Override) -> Result<(), StorageError>;

    /// Delete overrides matching `filter`; returns the number deleted
    async fn delete_overrides(
        &self,
        column: ColumnType,
        filter: &Filter,
    ) -> Result<usize, StorageError>;
}

/// Open the store selected by `settings`
pub fn open_store(settings: &StorageSettings) -> Result<Arc<dyn DocumentStore>, StorageError> {
    match settings.backend {
        StorageBackendKind::Memory => Ok(Arc::new(MemoryDocumentStore::new())),
        #[cfg(feature = "native-fs")]
        StorageBackendKind::Filesystem => {
            Ok(Arc::new(FileSystemDocumentStore::new(&settings.path)))
        }
        #[cfg(not(feature = "native-fs"))]
        StorageBackendKind::Filesystem => Err(StorageError::BackendError(
            "filesystem backend requires the native-fs feature".to_string(),
        )),
    }
}
