//! Taglist - report the comment tags in your sources
//!
//! A CLI tool and library that scans source files for annotation tags such as
//! `TODO`, `FIXME` or `@todo` and groups every occurrence by tag class, file
//! and line.
//!
//! # Features
//!
//! - Exact, case-insensitive and regular-expression tags, grouped into named tag classes
//! - Only tags inside `//` and `*` style comments are reported
//! - Comments continued over several lines are joined into one entry
//! - Configurable source encoding and locale
//! - Output reports in multiple formats (terminal, markdown, JSON)
//!
//! # Example
//!
//! ```rust,no_run
//! use taglist::*;
//! use std::path::Path;
//!
//! // Load configuration
//! let config = config::load_config(None).unwrap();
//! let tag_classes = config::build_tag_classes(&config).unwrap();
//! let options = config::build_scan_options(&config).unwrap();
//!
//! // Scan files
//! let files = scanner::find_files(Path::new("."), &config.includes, &config.excludes, &config.ignored_dirs).unwrap();
//! let mut scanner = Scanner::new(tag_classes, options);
//! scanner.scan_files(&files);
//!
//! // Collect the reports
//! let files_scanned = scanner.files_scanned();
//! let report = TaglistReport::new(scanner.finish(), Path::new(".").to_path_buf(), files_scanned);
//! ```

pub mod cli;
pub mod config;
pub mod filters;
pub mod logging;
pub mod models;
pub mod reporter;
pub mod scanner;
pub mod tag_class;
pub mod tags;

// Re-export commonly used types
pub use models::{Config, FileReport, TagReport, TaglistReport};
pub use scanner::{ScanOptions, Scanner};
pub use tag_class::TagClass;
pub use tags::{Locale, MatchKind, Tag, TagError};
