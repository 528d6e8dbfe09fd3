//! Redirect engine: resolve, validate and merge-update.
//!
//! [`RedirectEngine`] ties the pieces together:
//!
//! ```text
//! resolve(url)          Normalizer -> ResolutionCache (files + fundamental rules)
//! validate_*_url(url)   Normalizer -> DocumentStore + ResolutionCache
//! add(locale, pairs)    Normalizer -> conflict removal -> Compactor
//!                       -> orphan pruning (fix) -> RedirectStore -> invalidate cache
//! ```
//!
//! ## Merge Rules
//!
//! - Incoming pairs are appended after the stored ones, so they win on a
//!   duplicate source
//! - A stored redirect whose source is an incoming pair's target is dropped
//!   first; it would otherwise turn that target into a hub
//! - The combined set is compacted; cycles are dropped with a warning, or
//!   fail the call with [`AddOptions::strict`]
//! - With [`AddOptions::fix`], pairs whose source is real content again or
//!   whose internal target no longer exists are pruned

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CacheError, Resolution, ResolutionCache, ResolvedTable};
use crate::canonical::table_fingerprint;
use crate::compactor::{self, CompactError, CycleMode};
use crate::config::ContentRoots;
use crate::documents::DocumentStore;
use crate::fundamental::FundamentalRedirects;
use crate::locale::Locale;
use crate::normalize::{self, UrlError};
use crate::redirect_store::{self, RedirectStore, StoreError};
use crate::types::{DocUrl, RedirectPair, RedirectTarget};

/// Error type for URL validation.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The URL is malformed or has an unknown locale.
    #[error(transparent)]
    Url(#[from] UrlError),
    /// A from-URL still serves a document.
    #[error("From-URL resolves to a file ({location})")]
    FromExists {
        /// The from-URL.
        url: String,
        /// Where the document lives.
        location: String,
    },
    /// The URL is already a redirect source.
    #[error("{url} is already matched as a redirect (to: '{resolved}')")]
    AlreadyRedirected {
        /// The URL checked.
        url: String,
        /// Where it currently resolves.
        resolved: String,
    },
    /// An internal to-URL has no document.
    #[error("To-URL has to resolve to a file ({url})")]
    ToMissing {
        /// The to-URL.
        url: String,
    },
    /// An external to-URL could not be parsed.
    #[error("Invalid external URL '{url}': {source}")]
    InvalidExternal {
        /// The to-URL.
        url: String,
        /// Parser error.
        source: url::ParseError,
    },
    /// An external to-URL does not use https.
    #[error("We only redirect to https:// (got '{scheme}' in '{url}')")]
    NotHttps {
        /// The to-URL.
        url: String,
        /// The scheme found.
        scheme: String,
    },
    /// The current redirects could not be loaded.
    #[error(transparent)]
    Store(#[from] CacheError),
}

/// Error type for [`RedirectEngine::add`].
#[derive(Debug, thiserror::Error)]
pub enum AddError {
    /// The target locale is not registered.
    #[error("'{0}' is not a valid locale")]
    UnknownLocale(String),
    /// A pair could not be canonicalized.
    #[error("{from}\t{to} is not a valid redirect: {source}")]
    InvalidPair {
        /// Raw from-URL.
        from: String,
        /// Raw to-URL.
        to: String,
        /// Why it was rejected.
        source: UrlError,
    },
    /// An incoming pair belongs to another locale.
    #[error("{url} does not belong to locale {expected}")]
    LocaleMismatch {
        /// The from-URL.
        url: String,
        /// The locale being updated.
        expected: Locale,
    },
    /// Reading or writing the locale's file failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The merged set contains a cycle (strict mode only).
    #[error(transparent)]
    Cycle(#[from] CompactError),
}

/// Options for [`RedirectEngine::add`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Prune orphaned redirects after compaction.
    pub fix: bool,
    /// Fail on cycles instead of dropping them.
    pub strict: bool,
}

impl AddOptions {
    /// Options with orphan pruning enabled.
    pub fn fix() -> Self {
        Self {
            fix: true,
            ..Self::default()
        }
    }
}

/// Why an orphaned redirect was pruned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "location")]
pub enum OrphanReason {
    /// The source is served by a document again.
    FromExists(String),
    /// The internal target no longer exists.
    ToMissing,
}

/// What an `add` call did.
#[derive(Debug, Clone, Serialize)]
pub struct AddOutcome {
    /// The locale's redirect file.
    pub path: PathBuf,
    /// Pairs written, sorted.
    pub pairs: Vec<RedirectPair>,
    /// Stored pairs dropped because an incoming pair targets their source.
    pub conflicts_removed: Vec<RedirectPair>,
    /// Cycles dropped during compaction.
    pub cycles: Vec<Vec<String>>,
    /// Pairs pruned by the orphan pass.
    pub orphans_removed: Vec<(RedirectPair, OrphanReason)>,
    /// Whether the file's bytes changed.
    pub changed: bool,
    /// Fingerprint of the written table.
    pub fingerprint: String,
}

/// Resolve, validate and merge-update redirects.
pub struct RedirectEngine<D: DocumentStore> {
    store: RedirectStore,
    documents: D,
    cache: ResolutionCache,
}

impl<D: DocumentStore> RedirectEngine<D> {
    /// Create an engine with the built-in fundamental rules.
    pub fn new(roots: ContentRoots, documents: D) -> Self {
        Self::with_fundamental(roots, documents, FundamentalRedirects::builtin())
    }

    /// Create an engine with a custom fundamental rule table.
    pub fn with_fundamental(
        roots: ContentRoots,
        documents: D,
        fundamental: FundamentalRedirects,
    ) -> Self {
        let store = RedirectStore::new(roots);
        let cache = ResolutionCache::new(store.clone(), fundamental);
        Self {
            store,
            documents,
            cache,
        }
    }

    /// The redirect file store.
    pub fn store(&self) -> &RedirectStore {
        &self.store
    }

    /// The document store.
    pub fn documents(&self) -> &D {
        &self.documents
    }

    /// The resolution cache.
    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Resolve a URL; unknown URLs come back unchanged.
    pub fn resolve(&self, url: &str) -> String {
        self.cache.resolve(url)
    }

    /// Resolve a URL and report which table answered.
    pub fn lookup(&self, url: &str) -> Resolution {
        self.cache.lookup(url)
    }

    /// Load redirect files into the cache (every discovered file when
    /// `files` is `None`).
    pub fn load(&self, files: Option<&[PathBuf]>, strict: bool) -> Result<Arc<ResolvedTable>, CacheError> {
        self.cache.load_files(files, strict)
    }

    /// Check that `url` can become a redirect source.
    pub fn validate_from_url(&self, url: &str) -> Result<DocUrl, ValidationError> {
        let from = DocUrl::parse(url)?;
        if let Some(location) = self.documents.locate(from.as_str()) {
            return Err(ValidationError::FromExists {
                url: url.to_string(),
                location,
            });
        }
        self.ensure_not_redirected(url)?;
        Ok(from)
    }

    /// Check that `url` can become a redirect target.
    ///
    /// External targets must be `https`; internal targets must be existing,
    /// non-redirecting documents.
    pub fn validate_to_url(&self, url: &str) -> Result<RedirectTarget, ValidationError> {
        if normalize::is_external(url) {
            normalize::check_forbidden_symbols(url)?;
            let parsed = url::Url::parse(url).map_err(|source| ValidationError::InvalidExternal {
                url: url.to_string(),
                source,
            })?;
            if parsed.scheme() != "https" {
                return Err(ValidationError::NotHttps {
                    url: url.to_string(),
                    scheme: parsed.scheme().to_string(),
                });
            }
            return Ok(RedirectTarget::External(url.to_string()));
        }

        let to = DocUrl::parse(url)?;
        self.ensure_not_redirected(url)?;
        if !self.documents.exists(to.as_str()) {
            return Err(ValidationError::ToMissing {
                url: url.to_string(),
            });
        }
        Ok(RedirectTarget::from(to))
    }

    /// Validate both ends of a proposed redirect.
    pub fn validate_pair(&self, from: &str, to: &str) -> Result<RedirectPair, ValidationError> {
        Ok(RedirectPair::new(
            self.validate_from_url(from)?,
            self.validate_to_url(to)?,
        ))
    }

    fn ensure_not_redirected(&self, url: &str) -> Result<(), ValidationError> {
        let resolution = self.cache.try_lookup(url)?;
        if resolution.is_redirect() {
            return Err(ValidationError::AlreadyRedirected {
                url: url.to_string(),
                resolved: resolution.target,
            });
        }
        Ok(())
    }

    /// Merge `updates` into a locale's redirects and persist the result.
    ///
    /// On any error the locale's file is left untouched. On success the
    /// resolution cache is invalidated.
    pub fn add<S: AsRef<str>>(
        &self,
        locale: &str,
        updates: &[(S, S)],
        options: AddOptions,
    ) -> Result<AddOutcome, AddError> {
        let locale = Locale::parse(locale).ok_or_else(|| AddError::UnknownLocale(locale.to_string()))?;

        let updates = canonicalize_pairs(updates.iter().map(|(f, t)| (f.as_ref(), t.as_ref())))?;
        for pair in &updates {
            check_target(&pair.to).map_err(|source| AddError::InvalidPair {
                from: pair.from.to_string(),
                to: pair.to.to_string(),
                source,
            })?;
        }
        if let Some(stray) = updates.iter().find(|p| p.from.locale() != locale) {
            return Err(AddError::LocaleMismatch {
                url: stray.from.to_string(),
                expected: locale,
            });
        }

        let path = self.store.file_path(locale)?;
        let previous = path
            .is_file()
            .then(|| std::fs::read_to_string(&path).ok())
            .flatten();
        let raw = redirect_store::load_raw(&path)?;
        let existing = canonicalize_pairs(raw.iter().map(|(f, t)| (f.as_str(), t.as_str())))?;

        let (mut merged, conflicts_removed) = remove_conflicting_redirects(existing, &updates);
        merged.extend(updates);

        let mode = if options.strict {
            CycleMode::Strict
        } else {
            CycleMode::Warn
        };
        let compaction = compactor::compact(merged, mode)?;

        let (pairs, orphans_removed) = if options.fix {
            self.remove_orphaned_redirects(compaction.pairs)
        } else {
            (compaction.pairs, Vec::new())
        };

        let rendered = redirect_store::render(&pairs);
        let changed = previous.as_deref() != Some(rendered.as_str());
        redirect_store::save(&path, &pairs)?;
        self.cache.invalidate();

        tracing::info!(
            locale = %locale,
            pairs = pairs.len(),
            conflicts = conflicts_removed.len(),
            cycles = compaction.cycles.len(),
            orphans = orphans_removed.len(),
            changed,
            "redirects updated"
        );

        Ok(AddOutcome {
            path,
            fingerprint: table_fingerprint(&pairs),
            pairs,
            conflicts_removed,
            cycles: compaction.cycles,
            orphans_removed,
            changed,
        })
    }

    /// Recompact a locale's redirects and prune orphans.
    pub fn fix(&self, locale: &str) -> Result<AddOutcome, AddError> {
        self.add::<&str>(locale, &[], AddOptions::fix())
    }

    fn remove_orphaned_redirects(
        &self,
        pairs: Vec<RedirectPair>,
    ) -> (Vec<RedirectPair>, Vec<(RedirectPair, OrphanReason)>) {
        let mut kept = Vec::with_capacity(pairs.len());
        let mut removed = Vec::new();
        for pair in pairs {
            if let Some(location) = self.documents.locate(pair.from.as_str()) {
                tracing::warn!(from = %pair.from, to = %pair.to, %location, "removing orphaned redirect (from exists)");
                removed.push((pair, OrphanReason::FromExists(location)));
            } else if !pair.to.is_external() && !self.documents.exists(pair.to.as_str()) {
                tracing::warn!(from = %pair.from, to = %pair.to, "removing orphaned redirect (to doesn't exist)");
                removed.push((pair, OrphanReason::ToMissing));
            } else {
                kept.push(pair);
            }
        }
        (kept, removed)
    }
}

impl<D: DocumentStore> std::fmt::Debug for RedirectEngine<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedirectEngine")
            .field("store", &self.store)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn canonicalize_pairs<'a, I>(raw: I) -> Result<Vec<RedirectPair>, AddError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    raw.into_iter()
        .map(|(from, to)| {
            RedirectPair::parse(from, to).map_err(|source| AddError::InvalidPair {
                from: from.to_string(),
                to: to.to_string(),
                source,
            })
        })
        .collect()
}

/// Shape rules for a new target: external targets are `https` URLs,
/// internal ones are `/$locale/docs/` URLs.
fn check_target(to: &RedirectTarget) -> Result<(), UrlError> {
    match to {
        RedirectTarget::External(raw) => {
            let parsed = url::Url::parse(raw).map_err(|e| UrlError::InvalidUrl {
                url: raw.clone(),
                reason: e.to_string(),
            })?;
            if parsed.scheme() != "https" {
                return Err(UrlError::InvalidUrl {
                    url: raw.clone(),
                    reason: format!("We only redirect to https:// (got '{}')", parsed.scheme()),
                });
            }
            Ok(())
        }
        RedirectTarget::Internal(path) => normalize::validate_locale_segment(path).map(|_| ()),
    }
}

/// Drop stored pairs whose source is the target of an incoming pair.
///
/// Removals happen in the order of `updates`.
fn remove_conflicting_redirects(
    existing: Vec<RedirectPair>,
    updates: &[RedirectPair],
) -> (Vec<RedirectPair>, Vec<RedirectPair>) {
    let mut by_source: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, pair) in existing.iter().enumerate() {
        by_source.entry(pair.key()).or_default().push(index);
    }

    let mut slots: Vec<Option<RedirectPair>> = existing.into_iter().map(Some).collect();
    let mut removed = Vec::new();
    for update in updates {
        let Some(indices) = by_source.remove(&update.to.key()) else {
            continue;
        };
        for index in indices {
            if let Some(pair) = slots[index].take() {
                tracing::warn!(from = %pair.from, to = %pair.to, "removing conflicting redirect");
                removed.push(pair);
            }
        }
    }

    (slots.into_iter().flatten().collect(), removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::InMemoryDocumentStore;
    use crate::locale::DEFAULT_LOCALE;
    use tempfile::TempDir;

    fn engine(dir: &TempDir, documents: &[&str]) -> RedirectEngine<InMemoryDocumentStore> {
        let roots = ContentRoots::new(dir.path().join("content"))
            .with_translated_root(dir.path().join("translated"));
        RedirectEngine::new(roots, InMemoryDocumentStore::with_documents(documents))
    }

    fn stored(engine: &RedirectEngine<InMemoryDocumentStore>, locale: Locale) -> Vec<(String, String)> {
        engine
            .store()
            .load_locale(locale)
            .unwrap()
            .into_pairs()
            .into_iter()
            .map(|p| (p.from.to_string(), p.to.to_string()))
            .collect()
    }

    fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(f, t)| (f.to_string(), t.to_string()))
            .collect()
    }

    #[test]
    fn test_add_flattens_and_resolves() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, &["/en-us/docs/C"]);

        let outcome = engine
            .add(
                "en-us",
                &[("/en-us/docs/A", "/en-us/docs/B"), ("/en-us/docs/B", "/en-us/docs/C")],
                AddOptions::default(),
            )
            .unwrap();

        assert!(outcome.changed);
        assert_eq!(
            stored(&engine, DEFAULT_LOCALE),
            owned(&[("/en-us/docs/A", "/en-us/docs/C"), ("/en-us/docs/B", "/en-us/docs/C")])
        );
        assert_eq!(engine.resolve("/en-US/docs/a"), "/en-us/docs/C");
    }

    #[test]
    fn test_add_invalidates_cache() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, &["/fr/docs/B", "/fr/docs/C"]);

        engine
            .add("fr", &[("/fr/docs/A", "/fr/docs/B")], AddOptions::default())
            .unwrap();
        assert_eq!(engine.resolve("/fr/docs/A"), "/fr/docs/B");

        engine
            .add("fr", &[("/fr/docs/A", "/fr/docs/C")], AddOptions::default())
            .unwrap();
        assert_eq!(engine.resolve("/fr/docs/A"), "/fr/docs/C");
    }

    #[test]
    fn test_conflicting_redirect_removed() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, &["/en-US/docs/Z"]);
        engine
            .add("en-US", &[("/en-US/docs/Y", "/en-US/docs/Z")], AddOptions::default())
            .unwrap();

        let outcome = engine
            .add("en-US", &[("/en-US/docs/X", "/en-US/docs/Y")], AddOptions::default())
            .unwrap();

        assert_eq!(outcome.conflicts_removed.len(), 1);
        assert_eq!(outcome.conflicts_removed[0].from.as_str(), "/en-US/docs/Y");
        assert_eq!(
            stored(&engine, DEFAULT_LOCALE),
            owned(&[("/en-US/docs/X", "/en-US/docs/Y")])
        );
    }

    #[test]
    fn test_cycle_dropped_or_fatal() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, &[]);
        let cycle = [("/de/docs/A", "/de/docs/B"), ("/de/docs/B", "/de/docs/A")];

        let err = engine
            .add("de", &cycle, AddOptions { strict: true, ..AddOptions::default() })
            .unwrap_err();
        assert!(matches!(err, AddError::Cycle(_)));
        assert!(!engine.store().file_path(Locale::parse("de").unwrap()).unwrap().exists());

        let outcome = engine.add("de", &cycle, AddOptions::default()).unwrap();
        assert!(outcome.pairs.is_empty());
        assert_eq!(outcome.cycles.len(), 1);
    }

    #[test]
    fn test_fix_prunes_orphans() {
        let dir = TempDir::new().unwrap();
        let mut documents = InMemoryDocumentStore::with_documents(["/en-US/docs/Target"]);
        let roots = ContentRoots::new(dir.path());
        let seeded = RedirectEngine::new(roots.clone(), documents.clone());
        seeded
            .add(
                "en-US",
                &[
                    ("/en-US/docs/Back", "/en-US/docs/Target"),
                    ("/en-US/docs/Gone", "/en-US/docs/Missing"),
                    ("/en-US/docs/Out", "https://example.com/"),
                ],
                AddOptions::default(),
            )
            .unwrap();

        documents.add_document("/en-US/docs/Back");
        let engine = RedirectEngine::new(roots, documents);
        let outcome = engine.fix("en-US").unwrap();

        assert_eq!(
            outcome
                .orphans_removed
                .iter()
                .map(|(p, r)| (p.from.as_str(), r.clone()))
                .collect::<Vec<_>>(),
            vec![
                ("/en-US/docs/Back", OrphanReason::FromExists("memory:/en-US/docs/Back".to_string())),
                ("/en-US/docs/Gone", OrphanReason::ToMissing),
            ]
        );
        assert_eq!(
            stored(&engine, DEFAULT_LOCALE),
            owned(&[("/en-US/docs/Out", "https://example.com/")])
        );
    }

    #[test]
    fn test_add_rejects_bad_input_without_writing() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, &[]);

        assert!(matches!(
            engine.add("xx", &[("/xx/docs/A", "/xx/docs/B")], AddOptions::default()),
            Err(AddError::UnknownLocale(code)) if code == "xx"
        ));
        assert!(matches!(
            engine.add("fr", &[("/de/docs/A", "/de/docs/B")], AddOptions::default()),
            Err(AddError::LocaleMismatch { .. })
        ));
        assert!(matches!(
            engine.add("fr", &[("/fr/docs/A%09", "/fr/docs/B")], AddOptions::default()),
            Err(AddError::InvalidPair { .. })
        ));
        assert!(engine.store().discover_files().unwrap().is_empty());
    }

    #[test]
    fn test_add_rejects_malformed_targets() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, &[]);
        engine
            .add("en-US", &[("/en-US/docs/Keep", "https://example.com/")], AddOptions::default())
            .unwrap();
        let before = stored(&engine, DEFAULT_LOCALE);

        for target in ["http://insecure.example/x", "/not/a/doc", "/xx/docs/Nope", "https://exa mple.com/"] {
            let result = engine.add("en-US", &[("/en-US/docs/A", target)], AddOptions::default());
            assert!(
                matches!(result, Err(AddError::InvalidPair { ref to, .. }) if to == target),
                "{} should be rejected, got {:?}",
                target,
                result
            );
        }
        assert_eq!(stored(&engine, DEFAULT_LOCALE), before);
    }

    #[test]
    fn test_validate_surfaces_broken_store() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, &["/en-US/docs/B"]);
        engine
            .add("en-US", &[("/en-US/docs/A", "/en-US/docs/B")], AddOptions::default())
            .unwrap();
        let de = dir.path().join("translated").join("de");
        std::fs::create_dir_all(&de).unwrap();
        std::fs::write(de.join(redirect_store::REDIRECTS_FILE_NAME), "broken line\n").unwrap();

        assert!(matches!(
            engine.validate_from_url("/en-US/docs/A"),
            Err(ValidationError::Store(CacheError::Store(_)))
        ));
        assert!(matches!(
            engine.validate_to_url("/en-US/docs/B"),
            Err(ValidationError::Store(_))
        ));
    }

    #[test]
    fn test_readd_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, &["/ja/docs/B"]);
        let pairs = [("/ja/docs/A", "/ja/docs/B")];

        assert!(engine.add("ja", &pairs, AddOptions::default()).unwrap().changed);
        let again = engine.add("ja", &pairs, AddOptions::default()).unwrap();
        assert!(!again.changed);
    }

    #[test]
    fn test_validate_from_url() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, &["/en-US/docs/Live", "/en-US/docs/B"]);
        engine
            .add("en-US", &[("/en-US/docs/A", "/en-US/docs/B")], AddOptions::default())
            .unwrap();

        assert!(engine.validate_from_url("/en-US/docs/New").is_ok());
        assert!(matches!(
            engine.validate_from_url("/en-US/docs/Live"),
            Err(ValidationError::FromExists { .. })
        ));
        assert!(matches!(
            engine.validate_from_url("/en-us/docs/a"),
            Err(ValidationError::AlreadyRedirected { resolved, .. }) if resolved == "/en-US/docs/B"
        ));

        let err = engine.validate_from_url("/xx/docs/Foo").unwrap_err();
        assert!(err.to_string().contains("'xx'"));
    }

    #[test]
    fn test_validate_to_url() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, &["/en-US/docs/B"]);
        engine
            .add("en-US", &[("/en-US/docs/A", "/en-US/docs/B")], AddOptions::default())
            .unwrap();

        assert!(engine.validate_to_url("/en-US/docs/B").is_ok());
        assert!(engine.validate_to_url("https://example.com/page").unwrap().is_external());
        assert!(matches!(
            engine.validate_to_url("http://example.com/page"),
            Err(ValidationError::NotHttps { scheme, .. }) if scheme == "http"
        ));
        assert!(matches!(
            engine.validate_to_url("https://exa mple.com:99999/"),
            Err(ValidationError::InvalidExternal { .. })
        ));
        assert!(matches!(
            engine.validate_to_url("/en-US/docs/A"),
            Err(ValidationError::AlreadyRedirected { .. })
        ));
        assert!(matches!(
            engine.validate_to_url("/en-US/docs/Nowhere"),
            Err(ValidationError::ToMissing { .. })
        ));
    }

    #[test]
    fn test_conflict_removal_follows_update_order() {
        let existing = vec![
            RedirectPair::parse("/en-US/docs/P", "/en-US/docs/Q").unwrap(),
            RedirectPair::parse("/en-US/docs/R", "/en-US/docs/S").unwrap(),
            RedirectPair::parse("/en-US/docs/T", "/en-US/docs/U").unwrap(),
        ];
        let updates = vec![
            RedirectPair::parse("/en-US/docs/X", "/en-US/docs/r").unwrap(),
            RedirectPair::parse("/en-US/docs/W", "/en-US/docs/P").unwrap(),
        ];

        let (kept, removed) = remove_conflicting_redirects(existing, &updates);
        assert_eq!(
            removed.iter().map(|p| p.from.as_str()).collect::<Vec<_>>(),
            vec!["/en-US/docs/R", "/en-US/docs/P"]
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].from.as_str(), "/en-US/docs/T");
    }
}
