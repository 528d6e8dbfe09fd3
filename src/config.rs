//! Content root configuration.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `CONTENT_ROOT`: root of the default-locale (`en-us`) content (required)
//! - `CONTENT_TRANSLATED_ROOT`: root holding every other locale (optional)
//! - `ARCHIVED_URLS_FILE`: newline-separated list of archived document URLs
//!   that count as existing (optional)

use std::path::{Path, PathBuf};

use crate::locale::Locale;

/// Environment variable naming the default-locale content root.
pub const CONTENT_ROOT_ENV: &str = "CONTENT_ROOT";
/// Environment variable naming the translated content root.
pub const CONTENT_TRANSLATED_ROOT_ENV: &str = "CONTENT_TRANSLATED_ROOT";
/// Environment variable naming the archived URL list.
pub const ARCHIVED_URLS_FILE_ENV: &str = "ARCHIVED_URLS_FILE";

/// Error type for configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("Env var {0} must be set")]
    Missing(&'static str),
    /// A locale other than the default was used without a translated root.
    #[error("No translated content root configured for locale '{0}' (set CONTENT_TRANSLATED_ROOT)")]
    NoTranslatedRoot(Locale),
}

/// Where content for each locale lives on disk.
///
/// `en-us` lives under `content_root`; every other locale lives under
/// `translated_root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRoots {
    /// Root for the default locale.
    pub content_root: PathBuf,
    /// Root for translated locales.
    pub translated_root: Option<PathBuf>,
    /// Archived URL list, if any.
    pub archived_urls_file: Option<PathBuf>,
}

impl ContentRoots {
    /// Roots with only a default-locale content root.
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
            translated_root: None,
            archived_urls_file: None,
        }
    }

    /// Set the translated content root.
    pub fn with_translated_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.translated_root = Some(root.into());
        self
    }

    /// Set the archived URL list.
    pub fn with_archived_urls_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.archived_urls_file = Some(path.into());
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let content_root = env_path(CONTENT_ROOT_ENV).ok_or(ConfigError::Missing(CONTENT_ROOT_ENV))?;
        Ok(Self {
            content_root,
            translated_root: env_path(CONTENT_TRANSLATED_ROOT_ENV),
            archived_urls_file: env_path(ARCHIVED_URLS_FILE_ENV),
        })
    }

    /// The root holding a locale's folder.
    pub fn root_for(&self, locale: Locale) -> Result<&Path, ConfigError> {
        if locale.is_default() {
            Ok(&self.content_root)
        } else {
            self.translated_root
                .as_deref()
                .ok_or(ConfigError::NoTranslatedRoot(locale))
        }
    }

    /// `<root>/<locale>` for a locale.
    pub fn locale_folder(&self, locale: Locale) -> Result<PathBuf, ConfigError> {
        Ok(self.root_for(locale)?.join(locale.folder_name()))
    }

    /// All configured roots, default first.
    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.content_root.as_path()).chain(self.translated_root.as_deref())
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
