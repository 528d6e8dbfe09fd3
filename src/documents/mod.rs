//! Document store backends.
//!
//! The redirect engine needs exactly one capability from the content store:
//! "does a document exist at this URL". Everything else about documents
//! (metadata, rendering, folder layout beyond the URL mapping) is out of
//! scope.

pub mod fs;
pub mod memory;

/// Trait for document existence lookups.
///
/// Lookups are case-insensitive on the URL, matching how redirects resolve.
pub trait DocumentStore: Send + Sync {
    /// Where the document served at `url` lives, if it exists.
    ///
    /// The returned string is for messages only (a file path, an archive
    /// marker, ...).
    fn locate(&self, url: &str) -> Option<String>;

    /// Whether a document exists at `url`.
    fn exists(&self, url: &str) -> bool {
        self.locate(url).is_some()
    }
}

impl<T: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<T> {
    fn locate(&self, url: &str) -> Option<String> {
        (**self).locate(url)
    }
}

pub use fs::{slug_to_folder, FsDocumentStore};
pub use memory::InMemoryDocumentStore;
