//! Filesystem document store for production use.
//!
//! A document at `/$locale/docs/$slug` lives at
//! `<root>/<locale>/<slug_to_folder(slug)>/index.html`, where `<root>` is the
//! content root for `en-us` and the translated root for every other locale.
//! URLs listed in the archived URL file also count as existing.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex_lite::Regex;

use super::DocumentStore;
use crate::config::ContentRoots;
use crate::locale::Locale;
use crate::normalize;

/// Marker prefix for documents found in the archived URL list.
pub const ARCHIVED_PREFIX: &str = "$ARCHIVED";

/// Maximum length in bytes of one folder name.
const MAX_FOLDER_NAME_BYTES: usize = 255;

/// Error type for the filesystem store.
#[derive(Debug, thiserror::Error)]
pub enum FsStoreError {
    /// The archived URL list could not be read.
    #[error("Failed to read archived URL list {}: {source}", .path.display())]
    ArchivedUrls {
        /// The list's path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Filesystem document store.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    roots: ContentRoots,
    /// Archived URLs as lookup keys.
    archived: BTreeSet<String>,
}

impl FsDocumentStore {
    /// Create a store over the given roots, without an archive list.
    pub fn new(roots: ContentRoots) -> Self {
        Self {
            roots,
            archived: BTreeSet::new(),
        }
    }

    /// Create a store and load the archived URL list named in `roots`, if any.
    pub fn open(roots: ContentRoots) -> Result<Self, FsStoreError> {
        let archived_file = roots.archived_urls_file.clone();
        let store = Self::new(roots);
        match archived_file {
            Some(path) => store.load_archived_urls(&path),
            None => Ok(store),
        }
    }

    /// Read a newline-separated archived URL list.
    pub fn load_archived_urls(self, path: &Path) -> Result<Self, FsStoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| FsStoreError::ArchivedUrls {
            path: path.to_path_buf(),
            source,
        })?;
        let urls: Vec<&str> = content.lines().collect();
        tracing::debug!(path = %path.display(), count = urls.len(), "loaded archived URLs");
        Ok(self.with_archived_urls(urls))
    }

    /// Mark URLs as archived (existing without content on disk).
    pub fn with_archived_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.archived.extend(
            urls.into_iter()
                .map(|u| normalize::lookup_key(u.as_ref().trim()))
                .filter(|u| !u.is_empty()),
        );
        self
    }

    /// The configured roots.
    pub fn roots(&self) -> &ContentRoots {
        &self.roots
    }

    /// Path of the `index.html` a URL maps to, whether or not it exists.
    pub fn index_path(&self, url: &str) -> Option<PathBuf> {
        let decoded = normalize::canonicalize(url).ok()?;
        let mut segments = decoded.splitn(4, '/');
        segments.next();
        let locale = Locale::parse(segments.next()?)?;
        segments.next();
        let slug = segments.next().unwrap_or_default();
        let folder = self.roots.locale_folder(locale).ok()?;
        Some(folder.join(slug_to_folder(slug)).join("index.html"))
    }
}

impl DocumentStore for FsDocumentStore {
    fn locate(&self, url: &str) -> Option<String> {
        if self.archived.contains(&normalize::lookup_key(url)) {
            return Some(format!("{}/{}", ARCHIVED_PREFIX, url));
        }
        let path = self.index_path(url)?;
        path.is_file().then(|| path.display().to_string())
    }
}

/// Map a slug to its folder path below a locale folder.
///
/// Characters that sanitizing would strip are spelled out first, so two
/// different slugs never collapse onto the same folder.
pub fn slug_to_folder(slug: &str) -> String {
    slug.replace('*', "_star_")
        .replace("::", "_doublecolon_")
        .replace(':', "_colon_")
        .replace('?', "_question_")
        .to_lowercase()
        .split('/')
        .map(sanitize_folder_name)
        .collect::<Vec<_>>()
        .join("/")
}

fn sanitize_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r#"[/\?<>\\:\*\|"\x00-\x1f\x7f-\x9f]"#).unwrap(),
            Regex::new(r"^(?i)(con|prn|aux|nul|com[0-9]|lpt[0-9])(\..*)?$").unwrap(),
            Regex::new(r"[\. ]+$").unwrap(),
        ]
    })
}

/// Strip characters and names that are not portable as folder names.
fn sanitize_folder_name(segment: &str) -> String {
    let [illegal, windows_reserved, trailing] = sanitize_patterns();

    let cleaned = illegal.replace_all(segment, "");
    if cleaned.chars().all(|c| c == '.') || windows_reserved.is_match(&cleaned) {
        return String::new();
    }
    let cleaned = trailing.replace_all(&cleaned, "").into_owned();

    if cleaned.len() <= MAX_FOLDER_NAME_BYTES {
        return cleaned;
    }
    let mut end = MAX_FOLDER_NAME_BYTES;
    while !cleaned.is_char_boundary(end) {
        end -= 1;
    }
    cleaned[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_doc(root: &Path, locale: &str, slug: &str) {
        let dir = root.join(locale).join(slug_to_folder(slug));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<p>hi</p>").unwrap();
    }

    #[test]
    fn test_slug_to_folder() {
        assert_eq!(slug_to_folder("Web/CSS/::before"), "web/css/_doublecolon_before");
        assert_eq!(slug_to_folder("Glossary/a*b?"), "glossary/a_star_b_question_");
        assert_eq!(slug_to_folder("Web/API/Foo:bar"), "web/api/foo_colon_bar");
        assert_eq!(slug_to_folder("A/<x>|\"y\""), "a/xy");
    }

    #[test]
    fn test_sanitize_reserved_and_trailing() {
        assert_eq!(sanitize_folder_name(".."), "");
        assert_eq!(sanitize_folder_name("con"), "");
        assert_eq!(sanitize_folder_name("con.txt"), "");
        assert_eq!(sanitize_folder_name("console"), "console");
        assert_eq!(sanitize_folder_name("name. . "), "name");
        let long = "é".repeat(200);
        let cut = sanitize_folder_name(&long);
        assert!(cut.len() <= MAX_FOLDER_NAME_BYTES);
        assert!(cut.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_locate_on_disk() {
        let content = TempDir::new().unwrap();
        let translated = TempDir::new().unwrap();
        write_doc(content.path(), "en-us", "Web/HTML");
        write_doc(translated.path(), "fr", "Web/CSS/::after");

        let store = FsDocumentStore::new(
            ContentRoots::new(content.path()).with_translated_root(translated.path()),
        );

        assert!(store.exists("/en-US/docs/Web/HTML"));
        assert!(store.exists("/en-us/docs/web/html"));
        assert!(store.exists("/fr/docs/Web/CSS/%3A%3Aafter"));
        assert!(!store.exists("/fr/docs/Web/HTML"));
        assert!(!store.exists("/xx/docs/Web/HTML"));
    }

    #[test]
    fn test_archived_urls() {
        let content = TempDir::new().unwrap();
        let list = content.path().join("archived.txt");
        std::fs::write(&list, "/en-US/docs/Old/Thing\n\n").unwrap();

        let store = FsDocumentStore::open(
            ContentRoots::new(content.path()).with_archived_urls_file(&list),
        )
        .unwrap();

        assert_eq!(
            store.locate("/en-us/docs/old/thing").as_deref(),
            Some("$ARCHIVED//en-us/docs/old/thing")
        );
    }

    #[test]
    fn test_archived_urls_match_after_decoding() {
        let content = TempDir::new().unwrap();
        let store = FsDocumentStore::new(ContentRoots::new(content.path()))
            .with_archived_urls(["/en-US/docs/A B", "/en-US/docs/C%3A%3AD"]);

        assert!(store.exists("/en-US/docs/A%20B"));
        assert!(store.exists("/en-us/docs/a b"));
        assert!(store.exists("/en-US/docs/C::D"));
        assert!(!store.exists("/en-US/docs/A_B"));
    }

    #[test]
    fn test_missing_archive_list_is_error() {
        let content = TempDir::new().unwrap();
        let result = FsDocumentStore::open(
            ContentRoots::new(content.path()).with_archived_urls_file(content.path().join("nope")),
        );
        assert!(matches!(result, Err(FsStoreError::ArchivedUrls { .. })));
    }
}
