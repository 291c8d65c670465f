use crate::models::TagReport;
use crate::tag_class::{ClassMatch, TagClass};
use crate::tags::{Locale, TagError};
use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8};
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufRead, Cursor};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB

const SLASH_COMMENT: &str = "//";
const STAR_COMMENT: &str = "*";

/// The comment syntax a tag was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentType {
    /// `// TODO ...`
    Slash,
    /// `/* TODO ...` or ` * TODO ...` inside a block comment
    Star,
}

impl CommentType {
    /// The lexeme that opens a line of this comment type
    pub fn lexeme(self) -> &'static str {
        match self {
            CommentType::Slash => SLASH_COMMENT,
            CommentType::Star => STAR_COMMENT,
        }
    }

    /// Classify the comment a match at byte `index` sits in, if any.
    ///
    /// Only the non-whitespace text right before the match is inspected, so a
    /// tag in a string literal that follows `//` is still taken as a comment.
    pub fn detect(line: &str, index: usize) -> Option<Self> {
        let before = line.get(..index).unwrap_or("").trim();
        if before.ends_with(SLASH_COMMENT) {
            Some(CommentType::Slash)
        } else if before.ends_with(STAR_COMMENT) {
            Some(CommentType::Star)
        } else {
            None
        }
    }
}

/// Settings for a scan
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Continue a comment over following lines of the same comment type
    pub multiple_line_comments: bool,

    /// Record tags without comment text using `no_comment_text`
    pub empty_comments: bool,

    /// Source encoding; UTF-8 when `None`
    pub encoding: Option<&'static Encoding>,

    /// Locale for case-insensitive tags
    pub locale: Locale,

    /// Placeholder recorded for tags with no comment
    pub no_comment_text: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            multiple_line_comments: true,
            empty_comments: true,
            encoding: None,
            locale: Locale::english(),
            no_comment_text: "--No comment--".to_string(),
        }
    }
}

impl ScanOptions {
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding.unwrap_or(UTF_8)
    }
}

/// Resolve an encoding label such as `UTF-8` or `ISO-8859-1`
pub fn encoding_for_label(label: Option<&str>) -> Result<Option<&'static Encoding>, TagError> {
    match label.map(str::trim) {
        None | Some("") => Ok(None),
        Some(label) => Encoding::for_label(label.as_bytes())
            .map(Some)
            .ok_or_else(|| TagError::UnknownEncoding {
                label: label.to_string(),
            }),
    }
}

/// Read a whole file and decode it. Malformed sequences become U+FFFD.
pub fn read_source(path: &Path, encoding: &'static Encoding) -> io::Result<String> {
    let bytes = fs::read(path)?;
    let (text, actual, had_errors) = encoding.decode(&bytes);
    if had_errors {
        debug!(
            "{} contains sequences invalid in {}",
            path.display(),
            actual.name()
        );
    }
    Ok(text.into_owned())
}

/// Line reader with unbounded lookahead.
///
/// Peeked lines stay queued and are returned again by `next_line`, so a
/// lookahead never consumes input.
pub struct LineQueue<R> {
    lines: io::Lines<R>,
    lookahead: VecDeque<String>,
    line_number: usize,
}

impl<R: BufRead> LineQueue<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            lookahead: VecDeque::new(),
            line_number: 0,
        }
    }

    /// Consume the next line
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        let line = match self.lookahead.pop_front() {
            Some(line) => Some(line),
            None => self.lines.next().transpose()?,
        };
        if line.is_some() {
            self.line_number += 1;
        }
        Ok(line)
    }

    /// Look at the line `n` positions past the last consumed one (0 = next)
    pub fn peek(&mut self, n: usize) -> io::Result<Option<&str>> {
        while self.lookahead.len() <= n {
            match self.lines.next() {
                Some(line) => self.lookahead.push_back(line?),
                None => return Ok(None),
            }
        }
        Ok(self.lookahead.get(n).map(String::as_str))
    }

    /// 1-based number of the last consumed line
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

/// Scans files for the tags of a set of tag classes
pub struct Scanner {
    tag_classes: Vec<TagClass>,
    options: ScanOptions,
    files_scanned: usize,
}

impl Scanner {
    pub fn new(tag_classes: Vec<TagClass>, options: ScanOptions) -> Self {
        Self {
            tag_classes,
            options,
            files_scanned: 0,
        }
    }

    pub fn tag_classes(&self) -> &[TagClass] {
        &self.tag_classes
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn files_scanned(&self) -> usize {
        self.files_scanned
    }

    /// Scan each file in order. A file that cannot be read is logged and skipped.
    pub fn scan_files(&mut self, files: &[PathBuf]) {
        for file in files {
            if !file.exists() {
                debug!("Skipping missing file {}", file.display());
                continue;
            }
            if let Err(err) = self.scan_file(file) {
                error!("Error while scanning the file {}: {:#}", file.display(), err);
            }
        }
    }

    /// Scan a single file from disk
    pub fn scan_file(&mut self, path: &Path) -> Result<()> {
        debug!("Scanning {}", path.display());
        let text = read_source(path, self.options.encoding())
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        self.files_scanned += 1;
        self.scan_reader(path, Cursor::new(text))
            .with_context(|| format!("Failed to scan file: {}", path.display()))
    }

    /// Scan already-decoded text, recording occurrences under `path`.
    ///
    /// On a read error the occurrences recorded so far are kept.
    pub fn scan_reader<R: BufRead>(&mut self, path: &Path, reader: R) -> io::Result<()> {
        let mut lines = LineQueue::new(reader);

        while let Some(line) = lines.next_line()? {
            let line_number = lines.line_number();

            for class_index in 0..self.tag_classes.len() {
                let class = &self.tag_classes[class_index];
                let Some(found) = class.try_match(&line, &self.options.locale) else {
                    continue;
                };

                // Not inside a comment: later tag classes would look at the same text
                let Some(comment_type) = CommentType::detect(&line, found.index) else {
                    break;
                };

                let Some(comment) = self.extract_comment(&line, &found, comment_type, &mut lines)?
                else {
                    continue;
                };

                let encoding = self.options.encoding();
                self.tag_classes[class_index]
                    .report_mut()
                    .file_report_mut(path, encoding)
                    .add_comment(comment, line_number);
            }
        }

        Ok(())
    }

    /// Comment text for a match, or `None` when the occurrence is not recorded
    fn extract_comment<R: BufRead>(
        &self,
        line: &str,
        found: &ClassMatch<'_>,
        comment_type: CommentType,
        lines: &mut LineQueue<R>,
    ) -> io::Result<Option<String>> {
        let Some(mut comment) = first_line_text(line, found.end()) else {
            return Ok(self
                .options
                .empty_comments
                .then(|| self.options.no_comment_text.clone()));
        };

        if self.options.multiple_line_comments {
            self.append_continuation_lines(&mut comment, found.tag_string(), comment_type, lines)?;
        }

        Ok(Some(comment))
    }

    /// Append following lines of the same comment to `comment`
    fn append_continuation_lines<R: BufRead>(
        &self,
        comment: &mut String,
        tag_string: &str,
        comment_type: CommentType,
        lines: &mut LineQueue<R>,
    ) -> io::Result<()> {
        let lexeme = comment_type.lexeme();
        let locale = &self.options.locale;
        let mut ahead = 0;

        while let Some(next) = lines.peek(ahead)? {
            if !next.trim().starts_with(lexeme) || next.contains(tag_string) {
                break;
            }
            let Some(start) = next.find(lexeme) else {
                break;
            };

            let text = next[start + lexeme.len()..].trim();
            if text.starts_with('@') || text.is_empty() || text == "/" {
                break;
            }
            if self
                .tag_classes
                .iter()
                .any(|class| class.starts_with_any(text, locale))
            {
                break;
            }

            comment.push(' ');
            comment.push_str(text);
            ahead += 1;
        }

        Ok(())
    }

    /// Finish the scan and hand over one report per tag class, in configuration order
    pub fn finish(self) -> Vec<TagReport> {
        self.tag_classes
            .into_iter()
            .map(|class| {
                let mut report = class.into_report();
                report.finalize();
                report
            })
            .collect()
    }
}

/// Text after the tag on its own line, with an optional leading `:` removed.
///
/// `None` when nothing but an optional colon follows the tag.
fn first_line_text(line: &str, tag_end: usize) -> Option<String> {
    let rest = line.get(tag_end..).unwrap_or("").trim();
    let rest = rest.strip_suffix("*/").unwrap_or(rest).trim_end();

    if rest.is_empty() || rest == ":" {
        return None;
    }

    Some(match rest.strip_prefix(':') {
        Some(stripped) => stripped.trim().to_string(),
        None => rest.to_string(),
    })
}

/// Find the files to scan under `root`, sorted by path.
///
/// `.gitignore` rules are respected; `includes` and `excludes` are glob
/// patterns relative to `root`.
pub fn find_files(
    root: &Path,
    includes: &[String],
    excludes: &[String],
    ignored_dirs: &[String],
) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        warn!("{} is not a directory, nothing to scan", root.display());
        return Ok(Vec::new());
    }

    let mut overrides = OverrideBuilder::new(root);
    for pattern in includes {
        overrides
            .add(pattern)
            .with_context(|| format!("Invalid include pattern: {}", pattern))?;
    }
    for pattern in excludes {
        overrides
            .add(&format!("!{}", pattern))
            .with_context(|| format!("Invalid exclude pattern: {}", pattern))?;
    }
    let overrides = overrides.build().context("Failed to build file patterns")?;

    let mut walker = WalkBuilder::new(root);
    walker.standard_filters(true).overrides(overrides);

    let ignored_dirs = ignored_dirs.to_vec();
    walker.filter_entry(move |entry| {
        let name = entry.file_name().to_str().unwrap_or("");
        !ignored_dirs.iter().any(|ignored| ignored == name)
    });

    let mut files = Vec::new();
    for result in walker.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry: {}", err);
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        if let Ok(metadata) = entry.metadata() {
            if metadata.len() > MAX_FILE_SIZE {
                debug!("Skipping large file {}", entry.path().display());
                continue;
            }
        }

        files.push(entry.into_path());
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{MatchKind, Tag};
    use std::fs::File;
    use std::io::{Read, Write};
    use tempfile::TempDir;

    fn exact_class(tag: &str, n: usize) -> TagClass {
        TagClass::new(tag, format!("tag_class_{}", n))
            .with_tag(Tag::new(MatchKind::Exact, tag).unwrap())
    }

    fn scan(source: &str, classes: Vec<TagClass>, options: ScanOptions) -> Vec<TagReport> {
        let mut scanner = Scanner::new(classes, options);
        scanner
            .scan_reader(Path::new("Test.java"), Cursor::new(source.to_string()))
            .unwrap();
        scanner.finish()
    }

    fn scan_todo(source: &str, options: ScanOptions) -> Vec<(usize, String)> {
        let reports = scan(source, vec![exact_class("TODO", 1)], options);
        entries(&reports[0])
    }

    fn entries(report: &TagReport) -> Vec<(usize, String)> {
        report
            .file_reports()
            .flat_map(|fr| fr.comments().map(|(line, text)| (line, text.to_string())))
            .collect()
    }

    fn no_multiline() -> ScanOptions {
        ScanOptions {
            multiple_line_comments: false,
            ..ScanOptions::default()
        }
    }

    #[test]
    fn test_detect_comment_type() {
        assert_eq!(CommentType::detect("  // TODO x", 5), Some(CommentType::Slash));
        assert_eq!(CommentType::detect("  * TODO x", 4), Some(CommentType::Star));
        assert_eq!(CommentType::detect("/* TODO x */", 3), Some(CommentType::Star));
        assert_eq!(CommentType::detect("int TODO = 1;", 4), None);
        assert_eq!(CommentType::detect("TODO", 0), None);
    }

    #[test]
    fn test_colon_styles_are_equivalent() {
        for source in ["// TODO: text", "// TODO text", "// TODO:text", "/* TODO: text */"] {
            assert_eq!(scan_todo(source, ScanOptions::default()), vec![(1, "text".to_string())], "{source}");
        }
    }

    #[test]
    fn test_tag_outside_comment_is_ignored() {
        let source = "int TODO = 1;\nString s = \"see TODO list\";\n";
        let reports = scan(source, vec![exact_class("TODO", 1)], ScanOptions::default());
        assert_eq!(reports[0].count(), 0);
        assert_eq!(reports[0].file_reports().count(), 0);
    }

    #[test]
    fn test_empty_comment_placeholder() {
        let options = ScanOptions {
            no_comment_text: "--none--".to_string(),
            ..ScanOptions::default()
        };
        assert_eq!(scan_todo("// TODO", options.clone()), vec![(1, "--none--".to_string())]);
        assert_eq!(scan_todo("// TODO:", options), vec![(1, "--none--".to_string())]);

        let skip_empty = ScanOptions {
            empty_comments: false,
            ..ScanOptions::default()
        };
        assert!(scan_todo("// TODO\n// TODO :  ", skip_empty).is_empty());
    }

    #[test]
    fn test_multi_line_aggregation() {
        let source = "// TODO: line one,\n// line two,\n// line three.\nint x;\n";

        assert_eq!(
            scan_todo(source, ScanOptions::default()),
            vec![(1, "line one, line two, line three.".to_string())]
        );
        assert_eq!(scan_todo(source, no_multiline()), vec![(1, "line one,".to_string())]);
    }

    #[test]
    fn test_javadoc_multi_line_stops_at_comment_end() {
        let source = "\t/**\n\t * TODO: This is a\n\t * JavaDoc multi style tag.\n\t */\n\tvoid tag5() {}\n";
        assert_eq!(
            scan_todo(source, ScanOptions::default()),
            vec![(2, "This is a JavaDoc multi style tag.".to_string())]
        );
    }

    #[test]
    fn test_aggregation_stops_at_same_tag() {
        let source = "// TODO: first\n// more of first\n// TODO: second\n";
        assert_eq!(
            scan_todo(source, ScanOptions::default()),
            vec![
                (1, "first more of first".to_string()),
                (3, "second".to_string()),
            ]
        );
    }

    #[test]
    fn test_aggregation_stops_at_doc_tag_blank_and_close() {
        let source = " * TODO: first\n * @param x the x\n";
        assert_eq!(scan_todo(source, ScanOptions::default()), vec![(1, "first".to_string())]);

        let source = " * TODO: first\n *\n * not part\n";
        assert_eq!(scan_todo(source, ScanOptions::default()), vec![(1, "first".to_string())]);

        let source = " * TODO: first\n */\n";
        assert_eq!(scan_todo(source, ScanOptions::default()), vec![(1, "first".to_string())]);

        let source = "// TODO: first\nint x; // trailing\n";
        assert_eq!(scan_todo(source, ScanOptions::default()), vec![(1, "first".to_string())]);
    }

    #[test]
    fn test_aggregation_stops_at_other_tag_class() {
        let source = "// TODO: first\n// FIXME: broken\n// still broken\n";
        let reports = scan(
            source,
            vec![exact_class("TODO", 1), exact_class("FIXME", 2)],
            ScanOptions::default(),
        );

        assert_eq!(entries(&reports[0]), vec![(1, "first".to_string())]);
        assert_eq!(entries(&reports[1]), vec![(2, "broken still broken".to_string())]);
    }

    #[test]
    fn test_empty_comment_does_not_aggregate() {
        let source = "// TODO\n// following text\n";
        assert_eq!(
            scan_todo(source, ScanOptions::default()),
            vec![(1, "--No comment--".to_string())]
        );
    }

    #[test]
    fn test_several_tag_classes_on_one_line() {
        let reports = scan(
            "// TODO // FIXME both",
            vec![exact_class("TODO", 1), exact_class("FIXME", 2)],
            no_multiline(),
        );
        assert_eq!(entries(&reports[0]), vec![(1, "// FIXME both".to_string())]);
        assert_eq!(entries(&reports[1]), vec![(1, "both".to_string())]);
    }

    #[test]
    fn test_comment_type_failure_skips_later_classes() {
        let reports = scan(
            "int TODO; // FIXME: real",
            vec![exact_class("TODO", 1), exact_class("FIXME", 2)],
            ScanOptions::default(),
        );
        assert_eq!(reports[0].count(), 0);
        assert_eq!(reports[1].count(), 0);
    }

    #[test]
    fn test_regex_tag_uses_matched_length() {
        let class = TagClass::new("Fixmes", "tag_class_1")
            .with_tag(Tag::new(MatchKind::RegEx, "fixme[0-9]+").unwrap());
        let reports = scan("// fixme123: numbered", vec![class], ScanOptions::default());
        assert_eq!(entries(&reports[0]), vec![(1, "numbered".to_string())]);
    }

    #[test]
    fn test_line_queue_peek_does_not_consume() {
        let mut queue = LineQueue::new(Cursor::new("a\nb\nc\n"));

        assert_eq!(queue.next_line().unwrap().as_deref(), Some("a"));
        assert_eq!(queue.peek(1).unwrap(), Some("c"));
        assert_eq!(queue.peek(0).unwrap(), Some("b"));
        assert_eq!(queue.peek(2).unwrap(), None);
        assert_eq!(queue.line_number(), 1);

        assert_eq!(queue.next_line().unwrap().as_deref(), Some("b"));
        assert_eq!(queue.next_line().unwrap().as_deref(), Some("c"));
        assert_eq!(queue.next_line().unwrap(), None);
        assert_eq!(queue.line_number(), 3);
    }

    struct FailingReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::other("disk went away")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn test_read_error_keeps_earlier_occurrences() {
        let reader = io::BufReader::new(FailingReader {
            data: Cursor::new(b"// TODO: kept\nint x;\n".to_vec()),
        });
        let mut scanner = Scanner::new(vec![exact_class("TODO", 1)], ScanOptions::default());

        assert!(scanner.scan_reader(Path::new("Broken.java"), reader).is_err());
        let reports = scanner.finish();
        assert_eq!(entries(&reports[0]), vec![(1, "kept".to_string())]);
    }

    #[test]
    fn test_scan_files_skips_unreadable_files() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("Good.java");
        let mut file = File::create(&good).unwrap();
        writeln!(file, "// TODO: found").unwrap();

        let dir_as_file = temp_dir.path().join("NotAFile.java");
        fs::create_dir(&dir_as_file).unwrap();

        let mut scanner = Scanner::new(vec![exact_class("TODO", 1)], ScanOptions::default());
        scanner.scan_files(&[dir_as_file.clone(), good.clone(), temp_dir.path().join("Missing.java")]);

        assert_eq!(scanner.files_scanned(), 1);
        let reports = scanner.finish();
        assert_eq!(reports[0].count(), 1);
        assert!(reports[0].file_report(&good).is_some());
        assert!(reports[0].file_report(&dir_as_file).is_none());
    }

    #[test]
    fn test_scan_file_with_latin1_encoding() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Latin.java");
        fs::write(&path, b"// TODO: caf\xe9\n").unwrap();

        let options = ScanOptions {
            encoding: encoding_for_label(Some("ISO-8859-1")).unwrap(),
            ..ScanOptions::default()
        };
        let mut scanner = Scanner::new(vec![exact_class("TODO", 1)], options);
        scanner.scan_file(&path).unwrap();

        let reports = scanner.finish();
        assert_eq!(reports[0].file_report(&path).unwrap().comment(1), Some("café"));
    }

    #[test]
    fn test_encoding_for_label() {
        assert!(encoding_for_label(None).unwrap().is_none());
        assert_eq!(encoding_for_label(Some("utf-8")).unwrap(), Some(UTF_8));
        assert!(matches!(
            encoding_for_label(Some("klingon")),
            Err(TagError::UnknownEncoding { .. })
        ));
    }

    #[test]
    fn test_find_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src/com")).unwrap();
        fs::create_dir_all(root.join("target")).unwrap();
        fs::create_dir_all(root.join("src/generated")).unwrap();
        fs::write(root.join("src/com/B.java"), "").unwrap();
        fs::write(root.join("src/A.java"), "").unwrap();
        fs::write(root.join("src/notes.txt"), "").unwrap();
        fs::write(root.join("target/Built.java"), "").unwrap();
        fs::write(root.join("src/generated/Gen.java"), "").unwrap();

        let files = find_files(
            root,
            &["*.java".to_string()],
            &["**/generated/**".to_string()],
            &["target".to_string()],
        )
        .unwrap();

        assert_eq!(files, vec![root.join("src/A.java"), root.join("src/com/B.java")]);
    }
}
