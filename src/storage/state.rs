//! In-memory representation of one column shared by the store backends

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Coordinate, Document, Filter, Override};

/// Documents and overrides of a single column
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ColumnState {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    overrides: Vec<Override>,
}

type DocumentKey = (Coordinate, String);

fn key(document: &Document) -> DocumentKey {
    (document.coordinate(), document.datasource.clone())
}

impl ColumnState {
    pub(crate) fn documents(&self, filter: &Filter) -> Vec<Document> {
        self.documents
            .iter()
            .filter(|d| filter.matches_document(d))
            .cloned()
            .collect()
    }

    /// Replace by `(coordinate, datasource)`, appending new keys
    pub(crate) fn upsert_documents(&mut self, documents: Vec<Document>) -> usize {
        let mut incoming: BTreeMap<DocumentKey, Document> = BTreeMap::new();
        for document in documents {
            incoming.insert(key(&document), document);
        }
        let written = incoming.len();

        for existing in self.documents.iter_mut() {
            if let Some(replacement) = incoming.remove(&key(existing)) {
                *existing = replacement;
            }
        }
        self.documents.extend(incoming.into_values());
        written
    }

    pub(crate) fn swap_datasource(&mut self, datasource: &str, documents: Vec<Document>) -> usize {
        let before = self.documents.len();
        self.documents.retain(|d| d.datasource != datasource);
        let removed = before - self.documents.len();
        self.upsert_documents(documents);
        removed
    }

    pub(crate) fn delete_documents(&mut self, filter: &Filter) -> usize {
        let before = self.documents.len();
        self.documents.retain(|d| !filter.matches_document(d));
        before - self.documents.len()
    }

    pub(crate) fn overrides(&self, filter: &Filter) -> Vec<Override> {
        self.overrides
            .iter()
            .filter(|o| filter.matches_coordinate(&o.coordinate))
            .cloned()
            .collect()
    }

    pub(crate) fn upsert_override(&mut self, patch: Override) {
        match self
            .overrides
            .iter_mut()
            .find(|o| o.coordinate == patch.coordinate)
        {
            Some(existing) => *existing = patch,
            None => self.overrides.push(patch),
        }
    }

    pub(crate) fn delete_overrides(&mut self, filter: &Filter) -> usize {
        let before = self.overrides.len();
        self.overrides
            .retain(|o| !filter.matches_coordinate(&o.coordinate));
        before - self.overrides.len()
    }
}
