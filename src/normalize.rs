//! URL normalization for redirect keys.
//!
//! ## Canonical Form
//!
//! ```text
//! canonicalize(url) = join("/", percent_decode(segment) for segment in split("/", url))
//! lookup_key(url)   = lowercase(canonicalize(url))
//! ```
//!
//! - Each path segment is decoded independently.
//! - Case is folded only for lookup keys. Stored and displayed values keep the
//!   casing they were written with.
//! - URLs containing any of [`FORBIDDEN_URL_SYMBOLS`] are rejected, before and
//!   after decoding.

use percent_encoding::percent_decode_str;

use crate::locale::Locale;

/// Characters that may never appear in a redirect URL.
///
/// They would corrupt the two-column redirect file and the folder-name
/// mapping of the document store.
pub const FORBIDDEN_URL_SYMBOLS: &[char] = &['\t', '\n', '\r'];

/// Error type for URL normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    /// The URL contains a forbidden character.
    #[error("URL contains invalid character {symbol:?}: '{url}'")]
    ForbiddenSymbol {
        /// Offending URL.
        url: String,
        /// The forbidden character found.
        symbol: char,
    },
    /// The URL could not be decoded or parsed.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// Offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The URL is not shaped `/$locale/docs/...`.
    #[error("The URL is expected to be /$locale/docs/ (got '{url}')")]
    NotADocumentUrl {
        /// Offending URL.
        url: String,
    },
    /// The locale segment is not a registered locale.
    #[error("'{segment}' is not a valid locale (in '{url}')")]
    InvalidLocale {
        /// The offending locale segment.
        segment: String,
        /// Offending URL.
        url: String,
    },
}

/// Reject URLs that contain any forbidden symbol.
pub fn check_forbidden_symbols(url: &str) -> Result<(), UrlError> {
    match url.chars().find(|c| FORBIDDEN_URL_SYMBOLS.contains(c)) {
        Some(symbol) => Err(UrlError::ForbiddenSymbol {
            url: url.to_string(),
            symbol,
        }),
        None => Ok(()),
    }
}

/// Percent-decode every path segment independently and rejoin them.
pub fn decode_path(path: &str) -> Result<String, UrlError> {
    let segments = path
        .split('/')
        .map(|segment| {
            percent_decode_str(segment)
                .decode_utf8()
                .map(|s| s.into_owned())
                .map_err(|e| UrlError::InvalidUrl {
                    url: path.to_string(),
                    reason: format!("segment '{}' is not valid UTF-8 once decoded: {}", segment, e),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(segments.join("/"))
}

/// Canonicalize a URL path for storage and comparison.
///
/// Casing is preserved; use [`lookup_key`] for comparisons.
pub fn canonicalize(url: &str) -> Result<String, UrlError> {
    check_forbidden_symbols(url)?;
    let decoded = decode_path(url)?;
    check_forbidden_symbols(&decoded)?;
    Ok(decoded)
}

/// Case-folded lookup key for a URL.
///
/// Never fails: input that cannot be canonicalized is folded as-is.
pub fn lookup_key(url: &str) -> String {
    canonicalize(url)
        .unwrap_or_else(|_| url.to_string())
        .to_lowercase()
}

/// Whether a redirect target points outside the documentation site.
pub fn is_external(url: &str) -> bool {
    url.contains("://")
}

/// Validate the `/$locale/docs/` prefix of a URL and return its locale.
pub fn validate_locale_segment(url: &str) -> Result<Locale, UrlError> {
    let mut segments = url.split('/');
    let leading = segments.next();
    let locale = segments.next().unwrap_or_default();
    let docs = segments.next();

    if leading != Some("") || locale.is_empty() || docs != Some("docs") {
        return Err(UrlError::NotADocumentUrl {
            url: url.to_string(),
        });
    }

    Locale::parse(locale).ok_or_else(|| UrlError::InvalidLocale {
        segment: locale.to_string(),
        url: url.to_string(),
    })
}
