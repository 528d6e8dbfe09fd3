//! Service state management.
//!
//! Holds the shared redirect engine and startup metadata.

use std::sync::Arc;
use std::time::Instant;

use crate::config::{ConfigError, ContentRoots};
use crate::documents::fs::FsStoreError;
use crate::documents::{DocumentStore, FsDocumentStore};
use crate::engine::RedirectEngine;

/// Error type for building service state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Environment configuration is incomplete.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The document store could not be opened.
    #[error(transparent)]
    Documents(#[from] FsStoreError),
}

/// Shared service state.
pub struct ServiceState<D: DocumentStore + 'static> {
    /// The redirect engine answering every request.
    pub engine: Arc<RedirectEngine<D>>,
    started_at: Instant,
}

impl<D: DocumentStore + 'static> ServiceState<D> {
    /// Wrap an engine.
    pub fn new(engine: RedirectEngine<D>) -> Self {
        Self {
            engine: Arc::new(engine),
            started_at: Instant::now(),
        }
    }

    /// Seconds since the state was created.
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl ServiceState<FsDocumentStore> {
    /// Create service state from environment variables.
    ///
    /// Reads `CONTENT_ROOT`, `CONTENT_TRANSLATED_ROOT` and
    /// `ARCHIVED_URLS_FILE` (see [`crate::config`]).
    pub fn from_env() -> Result<Self, StateError> {
        let roots = ContentRoots::from_env()?;
        let documents = FsDocumentStore::open(roots.clone())?;
        Ok(Self::new(RedirectEngine::new(roots, documents)))
    }
}

impl<D: DocumentStore + 'static> Clone for ServiceState<D> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            started_at: self.started_at,
        }
    }
}
