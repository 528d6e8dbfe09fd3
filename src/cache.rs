//! Resolution cache.
//!
//! A read-only, process-scoped view of every locale's redirects, built
//! lazily on the first lookup and held until explicitly invalidated.
//! Writers in the same process call [`ResolutionCache::invalidate`] after
//! persisting; the next lookup rebuilds from disk.
//!
//! A failed build is remembered as well: [`ResolutionCache::resolve`] keeps
//! answering from the fundamental rules alone without touching the disk
//! again until the cache is invalidated or reloaded.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::canonical::table_fingerprint;
use crate::compactor::{self, CompactError, CycleMode};
use crate::fundamental::FundamentalRedirects;
use crate::normalize;
use crate::redirect_store::{self, LocaleRedirectTable, RedirectStore, StoreError};

/// Error type for building the cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A redirect file could not be loaded.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A stored table contains a cycle (strict loading only).
    #[error("{}: {source}", .path.display())]
    Cycle {
        /// File holding the cycle.
        path: PathBuf,
        /// The cycle found.
        source: CompactError,
    },
}

/// Where a resolution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "status")]
pub enum ResolutionSource {
    /// An explicit redirect file entry.
    Table,
    /// A fundamental redirect rule, with its HTTP status.
    Fundamental(u16),
    /// No redirect applies.
    Unchanged,
}

/// Outcome of resolving one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// The resolved URL (the input itself when nothing applies).
    pub target: String,
    /// Which table answered.
    pub source: ResolutionSource,
}

impl Resolution {
    /// Whether the URL redirects somewhere.
    pub fn is_redirect(&self) -> bool {
        self.source != ResolutionSource::Unchanged
    }
}

/// Merged redirects of every loaded file, keyed by case-folded source.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTable {
    entries: HashMap<String, String>,
    files: usize,
    fingerprint: String,
}

impl ResolvedTable {
    /// Merge per-file tables. Later tables win on duplicate sources.
    pub fn from_tables<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = LocaleRedirectTable>,
    {
        let mut files = 0;
        let mut pairs = Vec::new();
        for table in tables {
            files += 1;
            pairs.extend(table.into_pairs());
        }
        let fingerprint = table_fingerprint(&pairs);
        let entries = pairs
            .into_iter()
            .map(|pair| (pair.key(), String::from(pair.to)))
            .collect();
        Self {
            entries,
            files,
            fingerprint,
        }
    }

    /// Target for a URL, compared case-insensitively after decoding.
    pub fn get(&self, url: &str) -> Option<&str> {
        self.entries
            .get(&normalize::lookup_key(url))
            .map(String::as_str)
    }

    /// Number of redirects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no redirects.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of files merged.
    pub fn files(&self) -> usize {
        self.files
    }

    /// Order-independent fingerprint of the merged content.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

#[derive(Debug, Default)]
enum Slot {
    #[default]
    Empty,
    Ready(Arc<ResolvedTable>),
    Failed,
}

/// Lazily built resolution cache.
pub struct ResolutionCache {
    store: RedirectStore,
    fundamental: FundamentalRedirects,
    table: RwLock<Slot>,
}

impl ResolutionCache {
    /// Create an empty cache over a store. Nothing is read until first use.
    pub fn new(store: RedirectStore, fundamental: FundamentalRedirects) -> Self {
        Self {
            store,
            fundamental,
            table: RwLock::new(Slot::Empty),
        }
    }

    /// Resolve a URL. Never fails; unknown URLs come back unchanged.
    pub fn resolve(&self, url: &str) -> String {
        self.lookup(url).target
    }

    /// Resolve a URL and report which table answered.
    ///
    /// Explicit redirects win over fundamental rules.
    pub fn lookup(&self, url: &str) -> Resolution {
        self.lookup_in(&self.table(), url)
    }

    /// Like [`lookup`](Self::lookup), but a table that fails to load is an
    /// error instead of an empty table.
    pub fn try_lookup(&self, url: &str) -> Result<Resolution, CacheError> {
        Ok(self.lookup_in(&*self.try_table()?, url))
    }

    fn lookup_in(&self, table: &ResolvedTable, url: &str) -> Resolution {
        if let Some(target) = table.get(url) {
            return Resolution {
                target: target.to_string(),
                source: ResolutionSource::Table,
            };
        }
        if let Some(fundamental) = self.fundamental.resolve(url) {
            return Resolution {
                target: fundamental.url,
                source: ResolutionSource::Fundamental(fundamental.status),
            };
        }
        Resolution {
            target: url.to_string(),
            source: ResolutionSource::Unchanged,
        }
    }

    /// The current table, building it on first use.
    ///
    /// A build failure is logged once and answered with an empty table until
    /// the next [`invalidate`](Self::invalidate) or [`reload`](Self::reload).
    pub fn table(&self) -> Arc<ResolvedTable> {
        match &*self.table.read() {
            Slot::Ready(table) => return Arc::clone(table),
            Slot::Failed => return Arc::new(ResolvedTable::default()),
            Slot::Empty => {}
        }
        match self.try_table() {
            Ok(table) => table,
            Err(e) => {
                tracing::error!(error = %e, "failed to load redirects, resolving without them");
                Arc::new(ResolvedTable::default())
            }
        }
    }

    /// The current table, building it on first use.
    ///
    /// Unlike [`table`](Self::table), a previously failed build is retried
    /// and its error returned.
    pub fn try_table(&self) -> Result<Arc<ResolvedTable>, CacheError> {
        if let Slot::Ready(table) = &*self.table.read() {
            return Ok(Arc::clone(table));
        }

        match self.build(None, false) {
            Ok(built) => {
                let mut slot = self.table.write();
                // Another caller may have finished first; keep theirs.
                if let Slot::Ready(table) = &*slot {
                    return Ok(Arc::clone(table));
                }
                let built = Arc::new(built);
                *slot = Slot::Ready(Arc::clone(&built));
                Ok(built)
            }
            Err(e) => {
                let mut slot = self.table.write();
                if !matches!(*slot, Slot::Ready(_)) {
                    *slot = Slot::Failed;
                }
                Err(e)
            }
        }
    }

    /// Rebuild from disk and replace the current table.
    pub fn reload(&self) -> Result<Arc<ResolvedTable>, CacheError> {
        self.load_files(None, false)
    }

    /// Load specific files (or every discovered file when `files` is `None`)
    /// and install the result.
    ///
    /// Every file is parsed fail-fast. With `strict`, each file's table must
    /// also compact without cycles.
    pub fn load_files(
        &self,
        files: Option<&[PathBuf]>,
        strict: bool,
    ) -> Result<Arc<ResolvedTable>, CacheError> {
        match self.build(files, strict) {
            Ok(built) => {
                let built = Arc::new(built);
                *self.table.write() = Slot::Ready(Arc::clone(&built));
                Ok(built)
            }
            Err(e) => {
                *self.table.write() = Slot::Failed;
                Err(e)
            }
        }
    }

    /// Drop the current table or remembered failure; the next lookup
    /// rebuilds from disk.
    pub fn invalidate(&self) {
        if !matches!(std::mem::take(&mut *self.table.write()), Slot::Empty) {
            tracing::debug!("redirect cache invalidated");
        }
    }

    /// Whether a table is currently held.
    pub fn is_loaded(&self) -> bool {
        matches!(*self.table.read(), Slot::Ready(_))
    }

    /// Whether the last build failed and has not been retried.
    pub fn is_failed(&self) -> bool {
        matches!(*self.table.read(), Slot::Failed)
    }

    /// The fundamental rules consulted after the explicit table.
    pub fn fundamental(&self) -> &FundamentalRedirects {
        &self.fundamental
    }

    fn build(&self, files: Option<&[PathBuf]>, strict: bool) -> Result<ResolvedTable, CacheError> {
        let files = match files {
            Some(files) => files.to_vec(),
            None => self.store.discover_files()?,
        };

        let mut tables = Vec::with_capacity(files.len());
        for path in &files {
            tracing::debug!(path = %path.display(), "checking redirects");
            let table = redirect_store::load(path)?;
            if strict {
                compactor::compact(table.sorted_pairs().into_iter().cloned(), CycleMode::Strict)
                    .map_err(|source| CacheError::Cycle {
                        path: path.clone(),
                        source,
                    })?;
            }
            tables.push(table);
        }

        let table = ResolvedTable::from_tables(tables);
        tracing::info!(
            files = table.files(),
            redirects = table.len(),
            fingerprint = %table.fingerprint(),
            "redirects loaded"
        );
        Ok(table)
    }
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("store", &self.store)
            .field("fundamental_rules", &self.fundamental.len())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentRoots;
    use crate::redirect_store::REDIRECTS_FILE_NAME;
    use tempfile::TempDir;

    fn write(dir: &TempDir, locale: &str, content: &str) -> PathBuf {
        let folder = dir.path().join(locale);
        std::fs::create_dir_all(&folder).unwrap();
        let path = folder.join(REDIRECTS_FILE_NAME);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cache(dir: &TempDir) -> ResolutionCache {
        let roots = ContentRoots::new(dir.path()).with_translated_root(dir.path());
        ResolutionCache::new(RedirectStore::new(roots), FundamentalRedirects::builtin())
    }

    #[test]
    fn test_lazy_load_and_resolve() {
        let dir = TempDir::new().unwrap();
        write(&dir, "en-us", "# h\n/en-US/docs/Old\t/en-US/docs/New\n");
        write(&dir, "fr", "# h\n/fr/docs/Vieux\t/fr/docs/Neuf\n");
        let cache = cache(&dir);

        assert!(!cache.is_loaded());
        assert_eq!(cache.resolve("/en-us/docs/OLD"), "/en-US/docs/New");
        assert_eq!(cache.resolve("/fr/docs/Vieux"), "/fr/docs/Neuf");
        assert!(cache.is_loaded());
        assert_eq!(cache.table().files(), 2);
    }

    #[test]
    fn test_identity_and_fundamental_fallback() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);

        let unchanged = cache.lookup("/en-US/docs/Web");
        assert_eq!(unchanged.target, "/en-US/docs/Web");
        assert!(!unchanged.is_redirect());

        let fundamental = cache.lookup("/en-US/docs/Web/");
        assert_eq!(fundamental.target, "/en-US/docs/Web");
        assert_eq!(fundamental.source, ResolutionSource::Fundamental(301));
    }

    #[test]
    fn test_stale_until_invalidated() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "en-us", "# h\n/en-US/docs/A\t/en-US/docs/B\n");
        let cache = cache(&dir);
        assert_eq!(cache.resolve("/en-US/docs/A"), "/en-US/docs/B");

        std::fs::write(&path, "# h\n/en-US/docs/A\t/en-US/docs/C\n").unwrap();
        assert_eq!(cache.resolve("/en-US/docs/A"), "/en-US/docs/B");

        cache.invalidate();
        assert_eq!(cache.resolve("/en-US/docs/A"), "/en-US/docs/C");
    }

    #[test]
    fn test_broken_file_failure_is_remembered() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "en-us", "# h\nbroken line\n");
        let cache = cache(&dir);

        assert_eq!(cache.resolve("/en-US/docs/A"), "/en-US/docs/A");
        assert!(!cache.is_loaded());
        assert!(cache.is_failed());

        // Fixing the file is not picked up by resolve until invalidated.
        std::fs::write(&path, "# h\n/en-US/docs/A\t/en-US/docs/B\n").unwrap();
        assert_eq!(cache.resolve("/en-US/docs/A"), "/en-US/docs/A");
        assert_eq!(cache.resolve("/en-US/docs/A/"), "/en-US/docs/A");

        cache.invalidate();
        assert_eq!(cache.resolve("/en-US/docs/A"), "/en-US/docs/B");
        assert!(cache.is_loaded());
    }

    #[test]
    fn test_try_table_retries_and_reports_failure() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "de", "# h\nbroken line\n");
        let cache = cache(&dir);

        assert!(matches!(cache.try_table(), Err(CacheError::Store(_))));
        assert!(matches!(cache.try_lookup("/de/docs/A"), Err(CacheError::Store(_))));
        assert!(cache.is_failed());

        std::fs::write(&path, "# h\n/de/docs/A\t/de/docs/B\n").unwrap();
        let resolution = cache.try_lookup("/de/docs/A").unwrap();
        assert_eq!(resolution.target, "/de/docs/B");
        assert_eq!(resolution.source, ResolutionSource::Table);
    }

    #[test]
    fn test_strict_load_rejects_stored_cycle() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "en-us",
            "# h\n/en-US/docs/A\t/en-US/docs/B\n/en-US/docs/B\t/en-US/docs/A\n",
        );
        let cache = cache(&dir);

        assert!(cache.load_files(Some(&[path.clone()]), false).is_ok());
        assert!(matches!(
            cache.load_files(Some(&[path]), true),
            Err(CacheError::Cycle { .. })
        ));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "en-us", "# h\n/en-US/docs/A\t/en-US/docs/B\n");
        let cache = cache(&dir);
        let before = cache.table().fingerprint().to_string();

        std::fs::write(&path, "# h\n/en-US/docs/A\t/en-US/docs/C\n").unwrap();
        let after = cache.reload().unwrap().fingerprint().to_string();
        assert_ne!(before, after);
    }
}
