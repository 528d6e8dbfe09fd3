//! In-memory document store for testing.

use std::collections::BTreeMap;

use super::DocumentStore;
use crate::normalize;

/// In-memory document store for testing.
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    /// Case-folded URL -> URL as added.
    documents: BTreeMap<String, String>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given URLs.
    pub fn with_documents<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut store = Self::new();
        for url in urls {
            store.add_document(url.as_ref());
        }
        store
    }

    /// Add a document.
    pub fn add_document(&mut self, url: &str) {
        self.documents
            .insert(normalize::lookup_key(url), url.to_string());
    }

    /// Remove a document. Returns whether it existed.
    pub fn remove_document(&mut self, url: &str) -> bool {
        self.documents.remove(&normalize::lookup_key(url)).is_some()
    }

    /// Get number of documents.
    pub fn num_documents(&self) -> usize {
        self.documents.len()
    }

    /// Get all document URLs, sorted by key.
    pub fn all_documents(&self) -> Vec<&str> {
        self.documents.values().map(String::as_str).collect()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn locate(&self, url: &str) -> Option<String> {
        self.documents
            .get(&normalize::lookup_key(url))
            .map(|stored| format!("memory:{}", stored))
    }
}
