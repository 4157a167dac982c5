//! In-memory storage backend
//!
//! Implements DocumentStore over a single lock. Every write, including the
//! datasource swap used by reload, happens under one write guard, so concurrent
//! readers never observe a partially applied operation.

use super::state::ColumnState;
use super::{DocumentStore, StorageError};
use crate::models::{ColumnType, Document, Filter, Override};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Process-local document store
#[derive(Default)]
pub struct MemoryDocumentStore {
    columns: RwLock<HashMap<ColumnType, ColumnState>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<ColumnType, ColumnState>>, StorageError> {
        self.columns
            .read()
            .map_err(|_| StorageError::BackendError("store lock poisoned".to_string()))
    }

    fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<ColumnType, ColumnState>>, StorageError> {
        self.columns
            .write()
            .map_err(|_| StorageError::BackendError("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn documents(
        &self,
        column: ColumnType,
        filter: &Filter,
    ) -> Result<Vec<Document>, StorageError> {
        Ok(self
            .read()?
            .get(&column)
            .map(|state| state.documents(filter))
            .unwrap_or_default())
    }

    async fn upsert_documents(
        &self,
        column: ColumnType,
        documents: Vec<Document>,
    ) -> Result<usize, StorageError> {
        Ok(self
            .write()?
            .entry(column)
            .or_default()
            .upsert_documents(documents))
    }

    async fn swap_datasource(
        &self,
        column: ColumnType,
        datasource: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StorageError> {
        Ok(self
            .write()?
            .entry(column)
            .or_default()
            .swap_datasource(datasource, documents))
    }

    async fn delete_documents(
        &self,
        column: ColumnType,
        filter: &Filter,
    ) -> Result<usize, StorageError> {
        Ok(self
            .write()?
            .get_mut(&column)
            .map(|state| state.delete_documents(filter))
            .unwrap_or(0))
    }

    async fn overrides(
        &self,
        column: ColumnType,
        filter: &Filter,
    ) -> Result<Vec<Override>, StorageError> {
        Ok(self
            .read()?
            .get(&column)
            .map(|state| state.overrides(filter))
            .unwrap_or_default())
    }

    async fn upsert_override(&self, patch: Override) -> Result<(), StorageError> {
        self.write()?
            .entry(patch.column)
            .or_default()
            .upsert_override(patch);
        Ok(())
    }

    async fn delete_overrides(
        &self,
        column: ColumnType,
        filter: &Filter,
    ) -> Result<usize, StorageError> {
        Ok(self
            .write()?
            .get_mut(&column)
            .map(|state| state.delete_overrides(filter))
            .unwrap_or(0))
    }
}
