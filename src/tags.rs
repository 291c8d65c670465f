//! Tag matching strategies.
//!
//! A [`Tag`] is a single rule used to spot an annotation marker in a line of
//! source text. Three kinds are supported, selected in configuration by their
//! `match_type` string:
//!
//! | `match_type` | Variant | Matches |
//! |---|---|---|
//! | `exact` | [`Tag::Exact`] | `todo` only |
//! | `ignoreCase` | [`Tag::IgnoreCase`] | `todo`, `Todo`, `TODO`, ... |
//! | `regEx` | [`Tag::RegEx`] | anything the pattern matches, e.g. `tod[aeo]` |

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Errors raised while building tags and scan settings from configuration
#[derive(Debug, Error)]
pub enum TagError {
    #[error("Invalid tag type string used: {kind}")]
    InvalidMatchKind { kind: String },

    #[error("Invalid regular expression tag '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },

    #[error("Unknown character encoding: {label}")]
    UnknownEncoding { label: String },
}

/// How a tag string is compared against a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchKind {
    #[default]
    Exact,
    IgnoreCase,
    RegEx,
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::IgnoreCase => "ignoreCase",
            MatchKind::RegEx => "regEx",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchKind {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(MatchKind::Exact),
            "ignoreCase" => Ok(MatchKind::IgnoreCase),
            "regEx" => Ok(MatchKind::RegEx),
            other => Err(TagError::InvalidMatchKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// Locale of the scanned sources, used for case-insensitive comparisons.
///
/// Tokens look like `en`, `en_US` or `en_US_win`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    language: String,
    country: String,
    variant: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self::english()
    }
}

impl Locale {
    pub fn english() -> Self {
        Self {
            language: "en".to_string(),
            country: String::new(),
            variant: String::new(),
        }
    }

    /// Parse a locale token, falling back to English on malformed input
    pub fn parse(token: &str) -> Self {
        let items: Vec<&str> = token.split('_').collect();
        if token.is_empty() || items.len() > 3 {
            warn!(
                "Invalid locale format '{}' for source files, using English",
                token
            );
            return Self::english();
        }

        let part = |i: usize| items.get(i).map(|s| s.to_string()).unwrap_or_default();
        Self {
            language: part(0),
            country: part(1),
            variant: part(2),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Languages whose dotted and dotless `i` are distinct letters
    fn has_dotless_i(&self) -> bool {
        matches!(self.language.to_ascii_lowercase().as_str(), "tr" | "az")
    }

    /// Append the lowercase form of `c` under this locale
    fn push_lowercase(&self, c: char, out: &mut String) {
        if self.has_dotless_i() {
            match c {
                'I' => return out.push('\u{0131}'),
                '\u{0130}' => return out.push('i'),
                _ => {}
            }
        }
        out.extend(c.to_lowercase());
    }

    pub fn to_lowercase(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            self.push_lowercase(c, &mut out);
        }
        out
    }
}

/// Position and byte length of a tag match within a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagMatch {
    pub index: usize,
    pub length: usize,
}

impl TagMatch {
    /// Byte offset just past the matched text
    pub fn end(&self) -> usize {
        self.index + self.length
    }
}

/// A single tag rule
#[derive(Debug, Clone)]
pub enum Tag {
    Exact(String),
    IgnoreCase(String),
    RegEx(Regex),
}

impl Tag {
    pub fn new(kind: MatchKind, match_string: &str) -> Result<Self, TagError> {
        match kind {
            MatchKind::Exact => Ok(Tag::Exact(match_string.to_string())),
            MatchKind::IgnoreCase => Ok(Tag::IgnoreCase(match_string.to_string())),
            MatchKind::RegEx => Regex::new(match_string)
                .map(Tag::RegEx)
                .map_err(|source| TagError::InvalidRegex {
                    pattern: match_string.to_string(),
                    source,
                }),
        }
    }

    /// Build a tag from its configured `match_type`; a missing or blank type means `exact`
    pub fn from_config(match_type: Option<&str>, match_string: &str) -> Result<Self, TagError> {
        let kind = match match_type.map(str::trim) {
            None | Some("") => MatchKind::default(),
            Some(kind) => kind.parse()?,
        };
        Self::new(kind, match_string)
    }

    pub fn kind(&self) -> MatchKind {
        match self {
            Tag::Exact(_) => MatchKind::Exact,
            Tag::IgnoreCase(_) => MatchKind::IgnoreCase,
            Tag::RegEx(_) => MatchKind::RegEx,
        }
    }

    /// The configured tag string (the pattern source for regex tags)
    pub fn tag_string(&self) -> &str {
        match self {
            Tag::Exact(s) | Tag::IgnoreCase(s) => s,
            Tag::RegEx(re) => re.as_str(),
        }
    }

    /// Find the first occurrence of this tag in `line`.
    ///
    /// For regex tags the length is the span of the text actually matched,
    /// which generally differs from the pattern length.
    pub fn find(&self, line: &str, locale: &Locale) -> Option<TagMatch> {
        match self {
            Tag::Exact(tag) => line.find(tag.as_str()).map(|index| TagMatch {
                index,
                length: tag.len(),
            }),
            Tag::IgnoreCase(tag) => find_ignore_case(line, &locale.to_lowercase(tag), locale),
            Tag::RegEx(re) => re.find(line).map(|m| TagMatch {
                index: m.start(),
                length: m.end() - m.start(),
            }),
        }
    }

    /// True if `text` begins with this tag
    pub fn starts_with(&self, text: &str, locale: &Locale) -> bool {
        match self {
            Tag::Exact(tag) => text.starts_with(tag.as_str()),
            Tag::IgnoreCase(tag) => {
                lowercase_prefix_len(text, &locale.to_lowercase(tag), locale).is_some()
            }
            Tag::RegEx(re) => re.find(text).is_some_and(|m| m.start() == 0),
        }
    }
}

/// Case-insensitive search that reports offsets in the original line.
///
/// The matched length is measured in `line`, so it equals the tag length
/// unless lowercasing changes the byte length of a matched character.
fn find_ignore_case(line: &str, needle: &str, locale: &Locale) -> Option<TagMatch> {
    if needle.is_empty() {
        return Some(TagMatch {
            index: 0,
            length: 0,
        });
    }

    line.char_indices().find_map(|(index, _)| {
        lowercase_prefix_len(&line[index..], needle, locale)
            .map(|length| TagMatch { index, length })
    })
}

/// Byte length of the prefix of `haystack` whose lowercase form equals `needle`
fn lowercase_prefix_len(haystack: &str, needle: &str, locale: &Locale) -> Option<usize> {
    let mut rest = needle;
    let mut lowered = String::with_capacity(4);

    for (offset, c) in haystack.char_indices() {
        if rest.is_empty() {
            return Some(offset);
        }
        lowered.clear();
        locale.push_lowercase(c, &mut lowered);
        rest = rest.strip_prefix(lowered.as_str())?;
    }

    rest.is_empty().then_some(haystack.len())
}
