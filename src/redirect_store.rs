//! Per-locale redirect files.
//!
//! ## File Format
//!
//! ```text
//! # FROM-URL<TAB>TO-URL
//! /<locale>/docs/Old_Slug<TAB>/<locale>/docs/New_Slug
//! ```
//!
//! - Blank lines and lines starting with `#` are skipped
//! - Every other line is exactly two tab-separated fields
//! - The file ends with a newline
//! - Saved files are sorted by (from, to), so re-saving an unchanged table
//!   is byte-identical
//!
//! Loading is fail-fast: the first malformed line aborts the whole file and
//! nothing from it is returned.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::canonical::table_fingerprint;
use crate::config::{ConfigError, ContentRoots};
use crate::locale::Locale;
use crate::types::{RedirectPair, RedirectTarget};

/// Name of the redirect file inside each locale folder.
pub const REDIRECTS_FILE_NAME: &str = "_redirects.txt";

/// First line of every saved redirect file.
pub const HEADER: &str = "# FROM-URL\tTO-URL";

/// Error type for redirect file operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A data line is malformed.
    #[error("Invalid line in {}: {reason} (line {line_number}) '{raw_line}'", .path.display())]
    MalformedLine {
        /// File containing the line.
        path: PathBuf,
        /// 1-based line number.
        line_number: usize,
        /// The line as read.
        raw_line: String,
        /// What is wrong with it.
        reason: String,
    },
    /// The file does not end with a newline.
    #[error("{} must have a trailing newline character.", .path.display())]
    MissingTrailingNewline {
        /// Offending file.
        path: PathBuf,
    },
    /// Reading failed.
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Writing failed.
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The locale has no configured root.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl StoreError {
    fn malformed(path: &Path, line_number: usize, raw_line: &str, reason: impl Into<String>) -> Self {
        Self::MalformedLine {
            path: path.to_path_buf(),
            line_number,
            raw_line: raw_line.to_string(),
            reason: reason.into(),
        }
    }
}

/// One locale's redirects, keyed by case-folded source URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleRedirectTable {
    entries: BTreeMap<String, RedirectPair>,
}

impl LocaleRedirectTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from pairs; a later pair replaces an earlier one with
    /// the same source.
    pub fn from_pairs<I: IntoIterator<Item = RedirectPair>>(pairs: I) -> Self {
        let mut table = Self::new();
        for pair in pairs {
            table.insert(pair);
        }
        table
    }

    /// Insert a pair, returning the one it replaced.
    pub fn insert(&mut self, pair: RedirectPair) -> Option<RedirectPair> {
        self.entries.insert(pair.key(), pair)
    }

    /// Target for a source URL, compared case-insensitively.
    pub fn get(&self, from: &str) -> Option<&RedirectTarget> {
        self.entries
            .get(&crate::normalize::lookup_key(from))
            .map(|pair| &pair.to)
    }

    /// Whether `from` is a redirect source in this table.
    pub fn contains_source(&self, from: &str) -> bool {
        self.get(from).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(lookup key, pair)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RedirectPair)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All pairs sorted by (from, to).
    pub fn sorted_pairs(&self) -> Vec<&RedirectPair> {
        let mut pairs: Vec<_> = self.entries.values().collect();
        pairs.sort();
        pairs
    }

    /// Consume the table into pairs sorted by (from, to).
    pub fn into_pairs(self) -> Vec<RedirectPair> {
        let mut pairs: Vec<_> = self.entries.into_values().collect();
        pairs.sort();
        pairs
    }

    /// Order-independent fingerprint of the table's content.
    pub fn fingerprint(&self) -> String {
        table_fingerprint(self.entries.values())
    }
}

/// Parse the content of a redirect file.
///
/// `path` is used only for error messages.
pub fn parse(content: &str, path: &Path) -> Result<LocaleRedirectTable, StoreError> {
    if !content.ends_with('\n') {
        return Err(StoreError::MissingTrailingNewline {
            path: path.to_path_buf(),
        });
    }

    let mut table = LocaleRedirectTable::new();
    for (index, line) in content.split('\n').enumerate() {
        let line_number = index + 1;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.trim().split('\t').collect();
        let [from, to] = fields[..] else {
            return Err(StoreError::malformed(path, line_number, line, "Not two strings split by tab"));
        };
        if !from.starts_with('/') {
            return Err(StoreError::malformed(path, line_number, line, "From-URL must start with a /"));
        }
        if !from.contains("/docs/") {
            return Err(StoreError::malformed(path, line_number, line, "From-URL must contain '/docs/'"));
        }
        let locale_segment = from.split('/').nth(1).unwrap_or_default();
        if Locale::parse(locale_segment).is_none() {
            return Err(StoreError::malformed(
                path,
                line_number,
                line,
                format!("The locale prefix is not valid '{}'", locale_segment),
            ));
        }
        if to.is_empty() {
            return Err(StoreError::malformed(path, line_number, line, "To-URL is empty"));
        }

        let pair = RedirectPair::parse(from, to)
            .map_err(|e| StoreError::malformed(path, line_number, line, e.to_string()))?;
        table.insert(pair);
    }

    Ok(table)
}

/// Load and validate a redirect file.
pub fn load(path: &Path) -> Result<LocaleRedirectTable, StoreError> {
    let content = read(path)?;
    let table = parse(&content, path)?;
    tracing::debug!(path = %path.display(), entries = table.len(), "loaded redirects");
    Ok(table)
}

/// Read a redirect file leniently, as raw `(from, to)` strings in file order.
///
/// A missing file yields no pairs. Fields may be separated by runs of tabs,
/// and no URL checks are made; callers canonicalize the result.
pub fn load_raw(path: &Path) -> Result<Vec<(String, String)>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = read(path)?;

    let mut pairs = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.trim().split('\t').filter(|f| !f.is_empty()).collect();
        let [from, to] = fields[..] else {
            return Err(StoreError::malformed(path, index + 1, line, "Not two strings split by tab"));
        };
        pairs.push((from.to_string(), to.to_string()));
    }
    Ok(pairs)
}

/// Render pairs in file format, sorted by (from, to).
pub fn render<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = &'a RedirectPair>,
{
    let mut sorted: Vec<&RedirectPair> = pairs.into_iter().collect();
    sorted.sort();

    let mut out = String::with_capacity(HEADER.len() + 1 + sorted.len() * 64);
    out.push_str(HEADER);
    out.push('\n');
    for pair in sorted {
        out.push_str(pair.from.as_str());
        out.push('\t');
        out.push_str(pair.to.as_str());
        out.push('\n');
    }
    out
}

/// Write pairs to `path`, replacing the file atomically.
///
/// The content is written to a sibling temporary file first and renamed into
/// place, so readers see either the old or the new file.
pub fn save<'a, I>(path: &Path, pairs: I) -> Result<(), StoreError>
where
    I: IntoIterator<Item = &'a RedirectPair>,
{
    let content = render(pairs);
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let tmp_path = path.with_file_name(format!(
        "{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or(REDIRECTS_FILE_NAME)
    ));
    if let Err(e) = write_then_rename(&tmp_path, path, content.as_bytes()) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(write_err(e));
    }

    tracing::info!(path = %path.display(), bytes = content.len(), "saved redirects");
    Ok(())
}

fn write_then_rename(tmp_path: &Path, path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(tmp_path)?;
    file.write_all(content)?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(tmp_path, path)
}

fn read(path: &Path) -> Result<String, StoreError> {
    std::fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Locates the redirect file of every locale under the content roots.
#[derive(Debug, Clone)]
pub struct RedirectStore {
    roots: ContentRoots,
}

impl RedirectStore {
    /// Create a store over the given roots.
    pub fn new(roots: ContentRoots) -> Self {
        Self { roots }
    }

    /// The configured roots.
    pub fn roots(&self) -> &ContentRoots {
        &self.roots
    }

    /// `<root>/<locale>/_redirects.txt`.
    pub fn file_path(&self, locale: Locale) -> Result<PathBuf, StoreError> {
        Ok(self.roots.locale_folder(locale)?.join(REDIRECTS_FILE_NAME))
    }

    /// Every existing redirect file under the configured roots, sorted.
    ///
    /// Each direct subfolder of a root is a locale folder. Roots that do not
    /// exist yet hold no files.
    pub fn discover_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut files = Vec::new();
        for root in self.roots.roots() {
            if !root.is_dir() {
                continue;
            }
            let entries = std::fs::read_dir(root).map_err(|source| StoreError::Read {
                path: root.to_path_buf(),
                source,
            })?;
            for entry in entries {
                let entry = entry.map_err(|source| StoreError::Read {
                    path: root.to_path_buf(),
                    source,
                })?;
                let candidate = entry.path().join(REDIRECTS_FILE_NAME);
                if entry.path().is_dir() && candidate.is_file() {
                    files.push(candidate);
                }
            }
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    /// Load one locale's validated table. A missing file is an empty table.
    pub fn load_locale(&self, locale: Locale) -> Result<LocaleRedirectTable, StoreError> {
        let path = self.file_path(locale)?;
        if !path.exists() {
            return Ok(LocaleRedirectTable::new());
        }
        load(&path)
    }

    /// Read one locale's raw pairs (see [`load_raw`]).
    pub fn load_raw_locale(&self, locale: Locale) -> Result<Vec<(String, String)>, StoreError> {
        load_raw(&self.file_path(locale)?)
    }

    /// Save one locale's pairs and return the file path.
    pub fn save_locale<'a, I>(&self, locale: Locale, pairs: I) -> Result<PathBuf, StoreError>
    where
        I: IntoIterator<Item = &'a RedirectPair>,
    {
        let path = self.file_path(locale)?;
        save(&path, pairs)?;
        Ok(path)
    }
}
