use chrono::{DateTime, Utc};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::scanner::read_source;

/// Occurrences of one tag class within one file
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Path to the scanned file
    path: PathBuf,

    /// Encoding used to read the file
    encoding: &'static Encoding,

    /// Comment text keyed by line number (first line for multi-line comments)
    comments: BTreeMap<usize, String>,

    /// Lazily derived `package.Stem` name
    qualified_name: OnceCell<String>,
}

impl FileReport {
    pub fn new(path: PathBuf, encoding: &'static Encoding) -> Self {
        Self {
            path,
            encoding,
            comments: BTreeMap::new(),
            qualified_name: OnceCell::new(),
        }
    }

    /// Record a comment at `line_number`, replacing any previous one on that line
    pub fn add_comment(&mut self, comment: impl Into<String>, line_number: usize) {
        self.comments.insert(line_number, comment.into());
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Line numbers with a recorded comment, ascending
    pub fn line_numbers(&self) -> Vec<usize> {
        self.comments.keys().copied().collect()
    }

    pub fn comment(&self, line_number: usize) -> Option<&str> {
        self.comments.get(&line_number).map(String::as_str)
    }

    /// `(line, comment)` pairs in line order
    pub fn comments(&self) -> impl Iterator<Item = (usize, &str)> {
        self.comments.iter().map(|(line, text)| (*line, text.as_str()))
    }

    pub fn count(&self) -> usize {
        self.comments.len()
    }

    /// Fully-qualified name of the file, e.g. `com.example.Widget`.
    ///
    /// Derived once from the first `package` or `namespace` declaration in the
    /// file. Files without one are named by their stem alone.
    pub fn qualified_name(&self) -> &str {
        self.qualified_name.get_or_init(|| self.derive_qualified_name())
    }

    /// Qualified name with `/` separators, e.g. `com/example/Widget`
    pub fn path_with_slashes(&self) -> String {
        self.qualified_name().replace('.', "/")
    }

    fn derive_qualified_name(&self) -> String {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        match read_source(&self.path, self.encoding) {
            Ok(text) => match find_package_declaration(&text) {
                Some(package) => format!("{}.{}", package, stem),
                None => stem,
            },
            Err(err) => {
                debug!("Could not read {} for its package: {}", self.path.display(), err);
                format!("unknown.{}", stem)
            }
        }
    }
}

const DECLARATION_KEYWORDS: &[&str] = &["package", "namespace"];

/// Find the first `package a.b;` / `namespace A.B {` declaration in source text
fn find_package_declaration(text: &str) -> Option<String> {
    text.lines().map(str::trim).find_map(|line| {
        DECLARATION_KEYWORDS.iter().find_map(|keyword| {
            let rest = line.strip_prefix(*keyword)?;
            if !rest.starts_with(char::is_whitespace) {
                return None;
            }
            let name: String = rest.chars().filter(|c| *c != ';' && *c != '{').collect();
            let name = name.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
    })
}

/// All occurrences of one tag class, grouped by file
#[derive(Debug, Clone)]
pub struct TagReport {
    /// Display name of the tag class
    display_name: String,

    /// Stable identifier for cross-referencing (HTML anchors and the like)
    link_id: String,

    /// Tag strings that make up the class, in registration order
    tag_strings: Vec<String>,

    file_reports: HashMap<PathBuf, FileReport>,

    /// Total occurrence count, fixed by `finalize`
    tag_count: Option<usize>,
}

impl TagReport {
    pub fn new(display_name: impl Into<String>, link_id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            link_id: link_id.into(),
            tag_strings: Vec::new(),
            file_reports: HashMap::new(),
            tag_count: None,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn link_id(&self) -> &str {
        &self.link_id
    }

    pub fn tag_strings(&self) -> &[String] {
        &self.tag_strings
    }

    pub(crate) fn add_tag_string(&mut self, tag_string: &str) {
        self.tag_strings.push(tag_string.to_string());
    }

    /// Get or create the report for `path`
    pub(crate) fn file_report_mut(
        &mut self,
        path: &Path,
        encoding: &'static Encoding,
    ) -> &mut FileReport {
        self.tag_count = None;
        self.file_reports
            .entry(path.to_path_buf())
            .or_insert_with(|| FileReport::new(path.to_path_buf(), encoding))
    }

    pub fn file_report(&self, path: &Path) -> Option<&FileReport> {
        self.file_reports.get(path)
    }

    /// File reports in no particular order
    pub fn file_reports(&self) -> impl Iterator<Item = &FileReport> {
        self.file_reports.values()
    }

    /// File reports ordered by qualified name, then path
    pub fn sorted_file_reports(&self) -> Vec<&FileReport> {
        let mut reports: Vec<&FileReport> = self.file_reports.values().collect();
        reports.sort_by(|a, b| {
            a.qualified_name()
                .cmp(b.qualified_name())
                .then_with(|| a.path().cmp(b.path()))
        });
        reports
    }

    /// Keep only the file reports matching `keep`
    pub(crate) fn retain_file_reports(&mut self, mut keep: impl FnMut(&FileReport) -> bool) {
        self.file_reports.retain(|_, report| keep(report));
        self.finalize();
    }

    /// Fix the occurrence count once scanning is over
    pub(crate) fn finalize(&mut self) -> usize {
        let count = self.compute_count();
        self.tag_count = Some(count);
        count
    }

    /// Number of occurrences across all files
    pub fn count(&self) -> usize {
        self.tag_count.unwrap_or_else(|| self.compute_count())
    }

    fn compute_count(&self) -> usize {
        self.file_reports.values().map(FileReport::count).sum()
    }
}

/// Finished scan: one tag report per configured tag class
#[derive(Debug, Clone)]
pub struct TaglistReport {
    /// Tag reports in configuration order
    pub tag_reports: Vec<TagReport>,

    /// Path that was scanned
    pub scan_path: PathBuf,

    /// Number of files read
    pub files_scanned: usize,

    /// When the scan was performed
    pub scan_time: DateTime<Utc>,
}

impl TaglistReport {
    pub fn new(tag_reports: Vec<TagReport>, scan_path: PathBuf, files_scanned: usize) -> Self {
        Self {
            tag_reports,
            scan_path,
            files_scanned,
            scan_time: Utc::now(),
        }
    }

    pub fn total_count(&self) -> usize {
        self.tag_reports.iter().map(TagReport::count).sum()
    }

    /// True when no tag class has a single occurrence
    pub fn is_empty(&self) -> bool {
        self.tag_reports.iter().all(|report| report.count() == 0)
    }

    /// Tag reports ordered by display name
    pub fn sorted_tag_reports(&self) -> Vec<&TagReport> {
        let mut reports: Vec<&TagReport> = self.tag_reports.iter().collect();
        reports.sort_by(|a, b| a.display_name().cmp(b.display_name()));
        reports
    }
}

/// One configured tag rule
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagConfig {
    pub match_string: String,

    /// `exact`, `ignoreCase` or `regEx`; `exact` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
}

/// One configured tag class
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagClassConfig {
    pub display_name: String,

    #[serde(default)]
    pub tags: Vec<TagConfig>,
}

impl TagClassConfig {
    /// A class holding a single exact tag named after itself
    pub fn exact(tag: &str) -> Self {
        Self {
            display_name: tag.to_string(),
            tags: vec![TagConfig {
                match_string: tag.to_string(),
                match_type: Some("exact".to_string()),
            }],
        }
    }
}

/// Configuration for the taglist scanner
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Continue a tag's comment over following comment lines
    #[serde(default = "default_true")]
    pub multiple_line_comments: bool,

    /// Report tags that have no comment text
    #[serde(default = "default_true")]
    pub empty_comments: bool,

    /// Character encoding label of the sources; UTF-8 when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    /// Locale of the sources, e.g. "en" or "tr_TR"
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Text recorded for tags without a comment
    #[serde(default = "default_no_comment_text")]
    pub no_comment_text: String,

    /// Glob patterns of files to scan
    #[serde(default = "default_includes")]
    pub includes: Vec<String>,

    /// Glob patterns of files to skip
    #[serde(default)]
    pub excludes: Vec<String>,

    /// Directory names never descended into
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,

    /// Render detail sections for tag classes with no occurrences
    #[serde(default)]
    pub show_empty_details: bool,

    /// Produce no report when nothing was found
    #[serde(default)]
    pub skip_empty_report: bool,

    /// Tag classes to scan for
    #[serde(default = "default_tag_classes")]
    pub tag_classes: Vec<TagClassConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            multiple_line_comments: true,
            empty_comments: true,
            encoding: None,
            locale: default_locale(),
            no_comment_text: default_no_comment_text(),
            includes: default_includes(),
            excludes: Vec::new(),
            ignored_dirs: default_ignored_dirs(),
            show_empty_details: false,
            skip_empty_report: false,
            tag_classes: default_tag_classes(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_no_comment_text() -> String {
    "--No comment--".to_string()
}

pub(crate) fn default_tag_classes() -> Vec<TagClassConfig> {
    ["@todo", "TODO", "FIXME"]
        .into_iter()
        .map(TagClassConfig::exact)
        .collect()
}

fn default_includes() -> Vec<String> {
    [
        "*.java", "*.kt", "*.scala", "*.groovy", "*.c", "*.h", "*.cc", "*.cpp", "*.hpp", "*.cs",
        "*.go", "*.rs", "*.js", "*.jsx", "*.ts", "*.tsx", "*.swift", "*.php", "*.dart",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_ignored_dirs() -> Vec<String> {
    vec![
        ".git".to_string(),
        "node_modules".to_string(),
        "target".to_string(),
        "dist".to_string(),
        "build".to_string(),
        "vendor".to_string(),
        ".gradle".to_string(),
        ".idea".to_string(),
    ]
}
