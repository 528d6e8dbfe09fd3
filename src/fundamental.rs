//! Fundamental redirects.
//!
//! Structural URL-shape fixes that do not depend on content: legacy API
//! paths, URLs missing their locale, locale aliases, trailing slashes. They
//! are consulted only after explicit redirects fail to match.
//!
//! Rules are tried in order and the first match wins.

use regex_lite::Regex;

use crate::locale::{Locale, DEFAULT_LOCALE};

/// HTTP status for a permanent move.
pub const MOVED_PERMANENTLY: u16 = 301;

/// HTTP status for a temporary move.
pub const FOUND: u16 = 302;

/// Legacy spellings of locale codes.
const LOCALE_ALIASES: &[(&str, &str)] = &[
    ("en", "en-US"),
    ("en_us", "en-US"),
    ("cn", "zh-CN"),
    ("zh_cn", "zh-CN"),
    ("zh-hans", "zh-CN"),
    ("zh_tw", "zh-TW"),
    ("zh-hant", "zh-TW"),
    ("jp", "ja"),
    ("pt", "pt-PT"),
];

/// Result of a fundamental redirect lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundamentalMatch {
    /// Where to send the request.
    pub url: String,
    /// HTTP status to answer with.
    pub status: u16,
}

#[derive(Debug, Clone)]
enum Rewrite {
    /// `$name` expansion of the pattern's captures.
    Template(String),
    /// Replace the first segment by its canonical locale.
    LocaleAlias,
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: Regex,
    rewrite: Rewrite,
    status: u16,
}

impl Rule {
    fn apply(&self, url: &str) -> Option<String> {
        let captures = self.pattern.captures(url)?;
        match &self.rewrite {
            Rewrite::Template(template) => {
                let mut out = String::new();
                captures.expand(template, &mut out);
                Some(out)
            }
            Rewrite::LocaleAlias => {
                let segment = captures.name("locale")?.as_str();
                let rest = captures.name("rest").map_or("", |m| m.as_str());
                LOCALE_ALIASES
                    .iter()
                    .find(|(alias, _)| alias.eq_ignore_ascii_case(segment))
                    .and_then(|(_, code)| Locale::parse(code))
                    .map(|locale| format!("/{}{}", locale, rest))
            }
        }
    }
}

/// Ordered table of fundamental redirect rules.
#[derive(Debug, Clone, Default)]
pub struct FundamentalRedirects {
    rules: Vec<Rule>,
}

impl FundamentalRedirects {
    /// A table with no rules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in rule set.
    pub fn builtin() -> Self {
        Self::try_builtin().expect("builtin fundamental redirect patterns are valid")
    }

    fn try_builtin() -> Result<Self, regex_lite::Error> {
        let missing_locale = format!("/{}/docs/${{slug}}", DEFAULT_LOCALE);
        Ok(Self::empty()
            .with_rule(
                r"(?i)^/api/v1/doc/(?P<locale>[^/]+)/(?P<slug>.+)$",
                "/${locale}/docs/${slug}",
                MOVED_PERMANENTLY,
            )?
            .with_rule(r"(?i)^/docs/(?P<slug>.+)$", &missing_locale, FOUND)?
            .with_locale_aliases()?
            .with_rule(
                r"^(?P<path>/[^/]+/docs/.+?)/+$",
                "${path}",
                MOVED_PERMANENTLY,
            )?)
    }

    /// Append a rule rewriting matches of `pattern` with `template`.
    ///
    /// The template may refer to captures as `$name` or `${name}`.
    pub fn with_rule(
        mut self,
        pattern: &str,
        template: &str,
        status: u16,
    ) -> Result<Self, regex_lite::Error> {
        self.rules.push(Rule {
            pattern: Regex::new(pattern)?,
            rewrite: Rewrite::Template(template.to_string()),
            status,
        });
        Ok(self)
    }

    fn with_locale_aliases(mut self) -> Result<Self, regex_lite::Error> {
        self.rules.push(Rule {
            pattern: Regex::new(r"^/(?P<locale>[^/]+)(?P<rest>/.*)?$")?,
            rewrite: Rewrite::LocaleAlias,
            status: MOVED_PERMANENTLY,
        });
        Ok(self)
    }

    /// Find the first rule matching `url`.
    ///
    /// A rule that would rewrite a URL to itself does not count as a match.
    pub fn resolve(&self, url: &str) -> Option<FundamentalMatch> {
        self.rules.iter().find_map(|rule| {
            rule.apply(url)
                .filter(|rewritten| rewritten != url)
                .map(|rewritten| FundamentalMatch {
                    url: rewritten,
                    status: rule.status,
                })
        })
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(url: &str) -> Option<(String, u16)> {
        FundamentalRedirects::builtin()
            .resolve(url)
            .map(|m| (m.url, m.status))
    }

    #[test]
    fn test_legacy_api_path() {
        assert_eq!(
            resolve("/api/v1/doc/fr/Web/HTML"),
            Some(("/fr/docs/Web/HTML".to_string(), 301))
        );
    }

    #[test]
    fn test_missing_locale() {
        assert_eq!(
            resolve("/docs/Web/CSS"),
            Some(("/en-US/docs/Web/CSS".to_string(), 302))
        );
    }

    #[test]
    fn test_locale_alias() {
        assert_eq!(
            resolve("/en/docs/Web"),
            Some(("/en-US/docs/Web".to_string(), 301))
        );
        assert_eq!(resolve("/CN/docs/Web"), Some(("/zh-CN/docs/Web".to_string(), 301)));
        assert_eq!(resolve("/jp"), Some(("/ja".to_string(), 301)));
    }

    #[test]
    fn test_trailing_slash() {
        assert_eq!(
            resolve("/de/docs/Web/API//"),
            Some(("/de/docs/Web/API".to_string(), 301))
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(resolve("/en-US/docs/Web/HTML"), None);
        assert_eq!(resolve("/"), None);
        assert!(FundamentalRedirects::empty().resolve("/docs/Web").is_none());
    }

    #[test]
    fn test_custom_rule() {
        let table = FundamentalRedirects::empty()
            .with_rule(r"^/old/(?P<rest>.*)$", "/en-US/docs/${rest}", 301)
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.resolve("/old/Foo").unwrap().url,
            "/en-US/docs/Foo"
        );
    }
}
