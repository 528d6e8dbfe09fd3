//! # redirect-kernel
//!
//! Deterministic redirect resolution for locale-partitioned documentation.
//!
//! The Redirect Kernel answers one question:
//!
//! > Given a document URL, where does it live **now**?
//!
//! ## Core Contract
//!
//! 1. Following a stored redirect always terminates in one step (no chains)
//! 2. Cycles are detected and never stored
//! 3. Every locale's redirect file is canonical: sorted, byte-stable on re-save
//!
//! ## Architecture
//!
//! ```text
//! resolve(url) → Normalizer → ResolutionCache ← RedirectStore (per-locale files)
//!                                    ↓
//!                           FundamentalRedirects
//!
//! add(locale, pairs) → Normalizer → conflict removal → Compactor
//!                    → orphan pruning → RedirectStore → cache invalidation
//!                                  ↑
//!                         DocumentStore (filesystem or memory)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same pair set → identical file bytes, whatever the input order
//! - `compact(compact(p)) == compact(p)`
//! - Lookups compare case-folded, percent-decoded URLs

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod canonical;
pub mod compactor;
pub mod config;
pub mod documents;
pub mod engine;
pub mod fundamental;
pub mod locale;
pub mod logging;
pub mod normalize;
pub mod redirect_store;
pub mod types;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use cache::{CacheError, Resolution, ResolutionCache, ResolutionSource, ResolvedTable};
pub use canonical::{canonical_hash, canonical_hash_hex, table_fingerprint, to_canonical_bytes};
pub use compactor::{compact, CompactError, Compaction, CycleMode};
pub use config::{ConfigError, ContentRoots};
pub use documents::{DocumentStore, FsDocumentStore, InMemoryDocumentStore};
pub use engine::{AddError, AddOptions, AddOutcome, OrphanReason, RedirectEngine, ValidationError};
pub use fundamental::{FundamentalMatch, FundamentalRedirects};
pub use locale::{Locale, DEFAULT_LOCALE, VALID_LOCALES};
pub use normalize::UrlError;
pub use redirect_store::{LocaleRedirectTable, RedirectStore, StoreError};
pub use types::{DocUrl, RedirectPair, RedirectTarget};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};
