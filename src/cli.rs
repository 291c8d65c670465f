use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "taglist")]
#[command(version, about = "Report TODO, FIXME and other comment tags", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Parser, Debug)]
pub enum Commands {
    /// Scan source files for comment tags
    Scan(ScanArgs),

    /// Write the default configuration to a file
    InitConfig(InitConfigArgs),
}

#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// File or directory to scan (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    pub format: OutputFormat,

    /// Output file (if not specified, writes to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to custom config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Filter: only show the tag class with this display name
    #[arg(short = 't', long)]
    pub tag_class: Option<String>,

    /// Filter: only show occurrences in files whose path contains this text
    #[arg(long)]
    pub file: Option<String>,

    /// Character encoding of the sources (e.g. UTF-8, ISO-8859-1)
    #[arg(short, long)]
    pub encoding: Option<String>,

    /// Locale of the sources for case-insensitive tags (e.g. "en", "tr_TR")
    #[arg(long)]
    pub locale: Option<String>,

    /// Do not continue comments over following lines
    #[arg(long)]
    pub no_multiline: bool,

    /// Do not report tags that have no comment text
    #[arg(long)]
    pub no_empty_comments: bool,

    /// Show detail sections for tag classes with no occurrences
    #[arg(long)]
    pub show_empty_details: bool,

    /// Produce no report when no tags were found
    #[arg(long)]
    pub skip_empty_report: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
pub struct InitConfigArgs {
    /// Where to write the configuration
    #[arg(default_value = ".taglistrc")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Formatted table output for terminal
    Terminal,
    /// Markdown format
    Markdown,
    /// JSON format
    Json,
}
