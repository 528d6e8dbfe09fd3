//! Locale registry.
//!
//! The set of locales is fixed. Matching is case-insensitive, but every
//! [`Locale`] carries the canonical casing (`en-US`, `pt-BR`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;

/// All locales a document URL may carry, in canonical casing.
pub const VALID_LOCALES: &[&str] = &[
    "ar", "bg", "bm", "bn", "ca", "de", "el", "en-US", "es", "fa", "fi", "fr", "he", "hi-IN",
    "hu", "id", "it", "ja", "kab", "ko", "ms", "my", "nl", "pl", "pt-BR", "pt-PT", "ru",
    "sv-SE", "th", "tr", "uk", "vi", "zh-CN", "zh-TW",
];

/// The locale used when none is given.
pub const DEFAULT_LOCALE: Locale = Locale("en-US");

/// A registered locale.
///
/// Ordering and equality follow the canonical code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Locale(&'static str);

impl Locale {
    /// Look up a locale, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        VALID_LOCALES
            .iter()
            .find(|code| code.eq_ignore_ascii_case(s))
            .map(|code| Self(*code))
    }

    /// Canonical code, e.g. `en-US`.
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Lower-cased code, as used for content folders.
    pub fn folder_name(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// Whether this is the default locale (content lives in the main root).
    pub fn is_default(&self) -> bool {
        *self == DEFAULT_LOCALE
    }

    /// Iterate over every registered locale.
    pub fn all() -> impl Iterator<Item = Locale> {
        VALID_LOCALES.iter().map(|code| Self(*code))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl<'de> Deserialize<'de> for Locale {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Locale::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown locale '{}'", s)))
    }
}
