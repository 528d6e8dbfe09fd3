//! URL types for redirect endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::locale::Locale;
use crate::normalize::{self, UrlError};

/// A canonical document URL (`/$locale/docs/...`).
///
/// Always percent-decoded, always starts with `/`, and always carries a
/// registered locale. Casing is preserved as written; [`DocUrl::key`] gives
/// the case-folded form used for comparisons.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocUrl {
    path: String,
    locale: Locale,
}

impl DocUrl {
    /// Parse and canonicalize a document URL.
    pub fn parse(raw: &str) -> Result<Self, UrlError> {
        let path = normalize::canonicalize(raw)?;
        let locale = normalize::validate_locale_segment(&path)?;
        Ok(Self { path, locale })
    }

    /// The canonical path.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// The locale segment of this URL.
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Case-folded lookup key.
    pub fn key(&self) -> String {
        self.path.to_lowercase()
    }

    /// Slug after `/$locale/docs/`.
    pub fn slug(&self) -> &str {
        self.path.splitn(4, '/').nth(3).unwrap_or_default()
    }
}

impl fmt::Display for DocUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl TryFrom<String> for DocUrl {
    type Error = UrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocUrl> for String {
    fn from(url: DocUrl) -> Self {
        url.path
    }
}

/// Where a redirect points.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RedirectTarget {
    /// A path on this site, percent-decoded.
    Internal(String),
    /// An absolute URL on another site, kept verbatim.
    External(String),
}

impl RedirectTarget {
    /// Parse a redirect target.
    ///
    /// Internal targets must start with `/` and are canonicalized. Anything
    /// containing `://` is treated as external. Scheme checks happen at
    /// validation time, not here.
    pub fn parse(raw: &str) -> Result<Self, UrlError> {
        if normalize::is_external(raw) {
            normalize::check_forbidden_symbols(raw)?;
            Ok(Self::External(raw.to_string()))
        } else if raw.starts_with('/') {
            Ok(Self::Internal(normalize::canonicalize(raw)?))
        } else {
            Err(UrlError::InvalidUrl {
                url: raw.to_string(),
                reason: "To-URL must start with a / or be an absolute URL".to_string(),
            })
        }
    }

    /// The target as written.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Internal(s) | Self::External(s) => s,
        }
    }

    /// Case-folded lookup key.
    pub fn key(&self) -> String {
        self.as_str().to_lowercase()
    }

    /// Whether this target leaves the site.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::External(_))
    }
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for RedirectTarget {
    type Error = UrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RedirectTarget> for String {
    fn from(target: RedirectTarget) -> Self {
        match target {
            RedirectTarget::Internal(s) | RedirectTarget::External(s) => s,
        }
    }
}

impl From<DocUrl> for RedirectTarget {
    fn from(url: DocUrl) -> Self {
        Self::Internal(url.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_url_parse() {
        let url = DocUrl::parse("/en-US/docs/Web/CSS/%3A%3Aafter").unwrap();
        assert_eq!(url.as_str(), "/en-US/docs/Web/CSS/::after");
        assert_eq!(url.locale().as_str(), "en-US");
        assert_eq!(url.slug(), "Web/CSS/::after");
        assert_eq!(url.key(), "/en-us/docs/web/css/::after");
    }

    #[test]
    fn test_doc_url_rejects_bad_shape() {
        assert!(DocUrl::parse("/en-US/blog/x").is_err());
        assert!(DocUrl::parse("/xx/docs/x").is_err());
        assert!(DocUrl::parse("https://example.com/en-US/docs/x").is_err());
    }

    #[test]
    fn test_target_parse() {
        assert_eq!(
            RedirectTarget::parse("/fr/docs/A%20B").unwrap(),
            RedirectTarget::Internal("/fr/docs/A B".to_string())
        );
        assert_eq!(
            RedirectTarget::parse("https://example.com/a%20b").unwrap(),
            RedirectTarget::External("https://example.com/a%20b".to_string())
        );
        assert!(RedirectTarget::parse("relative/path").is_err());
    }

    #[test]
    fn test_serde_as_strings() {
        let url = DocUrl::parse("/de/docs/Foo").unwrap();
        let json = serde_json::to_string(&url).unwrap();
        assert_eq!(json, "\"/de/docs/Foo\"");
        let back: DocUrl = serde_json::from_str(&json).unwrap();
        assert_eq!(back, url);

        let bad: Result<DocUrl, _> = serde_json::from_str("\"/nope/docs/Foo\"");
        assert!(bad.is_err());
    }
}
