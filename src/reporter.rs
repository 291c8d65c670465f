use crate::cli::OutputFormat;
use crate::models::{FileReport, TagReport, TaglistReport};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Rendering switches
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Render detail sections for tag classes with no occurrences
    pub show_empty_details: bool,
}

/// Generate and output a report in the specified format
pub fn generate_report(
    report: &TaglistReport,
    format: OutputFormat,
    output_path: Option<&Path>,
    options: RenderOptions,
) -> Result<()> {
    let output = render(report, format, options)?;

    if let Some(path) = output_path {
        fs::write(path, output)
            .with_context(|| format!("Failed to write output to {}", path.display()))?;
        println!("Report written to {}", path.display());
    } else {
        println!("{}", output);
    }

    Ok(())
}

/// Render a report to a string
pub fn render(report: &TaglistReport, format: OutputFormat, options: RenderOptions) -> Result<String> {
    match format {
        OutputFormat::Terminal => Ok(format_terminal(report, options)),
        OutputFormat::Markdown => Ok(format_markdown(report, options)),
        OutputFormat::Json => format_json(report),
    }
}

/// Tag reports that get a detail section
fn detailed_reports(report: &TaglistReport, options: RenderOptions) -> Vec<&TagReport> {
    report
        .sorted_tag_reports()
        .into_iter()
        .filter(|tag_report| options.show_empty_details || tag_report.count() > 0)
        .collect()
}

/// Format report as terminal table
fn format_terminal(report: &TaglistReport, options: RenderOptions) -> String {
    let mut output = String::new();

    // Header
    let line = "─".repeat(58);
    output.push_str(&format!("╭{}╮\n", line));
    output.push_str(&format!("│ {:^56} │\n", "Taglist - Tag Report"));
    output.push_str(&format!("│ Scanned: {:<47} │\n", report.scan_path.display()));
    output.push_str(&format!("│ Files: {:<49} │\n", report.files_scanned));
    output.push_str(&format!("│ Total Occurrences: {:<37} │\n", report.total_count()));
    output.push_str(&format!("╰{}╯\n\n", line));

    // Summary by tag class
    output.push_str("Summary by Tag Class:\n");
    let mut summary_table = Table::new();
    summary_table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Tag Class").fg(Color::Cyan),
            Cell::new("Tags").fg(Color::Cyan),
            Cell::new("Occurrences").fg(Color::Cyan),
        ]);

    for tag_report in report.sorted_tag_reports() {
        summary_table.add_row(vec![
            Cell::new(tag_report.display_name()),
            Cell::new(tag_report.tag_strings().join(", ")),
            Cell::new(tag_report.count().to_string()),
        ]);
    }
    output.push_str(&format!("{}\n\n", summary_table));

    // Details per tag class
    for tag_report in detailed_reports(report, options) {
        output.push_str(&format!(
            "{} ({} occurrences):\n",
            tag_report.display_name(),
            tag_report.count()
        ));

        let mut detail_table = Table::new();
        detail_table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("File").fg(Color::Cyan),
                Cell::new("Line").fg(Color::Cyan),
                Cell::new("Comment").fg(Color::Cyan),
            ]);

        for file_report in tag_report.sorted_file_reports() {
            for (line_number, comment) in file_report.comments() {
                detail_table.add_row(vec![
                    Cell::new(file_report.qualified_name()),
                    Cell::new(line_number.to_string()),
                    Cell::new(comment),
                ]);
            }
        }

        output.push_str(&format!("{}\n\n", detail_table));
    }

    output
}

/// Format report as Markdown
fn format_markdown(report: &TaglistReport, options: RenderOptions) -> String {
    let mut output = String::new();

    // Header
    output.push_str("# Taglist - Tag Report\n\n");
    output.push_str(&format!("**Scanned**: `{}`\n", report.scan_path.display()));
    output.push_str(&format!("**Files**: {}\n", report.files_scanned));
    output.push_str(&format!("**Total Occurrences**: {}\n", report.total_count()));
    output.push_str(&format!(
        "**Generated**: {}\n\n",
        report.scan_time.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    // Summary
    output.push_str("## Summary\n\n");
    output.push_str("| Tag Class | Tags | Occurrences |\n");
    output.push_str("|---|---|---|\n");
    for tag_report in report.sorted_tag_reports() {
        output.push_str(&format!(
            "| [{}](#{}) | {} | {} |\n",
            tag_report.display_name(),
            tag_report.link_id(),
            tag_report
                .tag_strings()
                .iter()
                .map(|tag| format!("`{}`", tag))
                .collect::<Vec<_>>()
                .join(", "),
            tag_report.count()
        ));
    }
    output.push('\n');

    // Details
    for tag_report in detailed_reports(report, options) {
        output.push_str(&format!(
            "<a id=\"{}\"></a>\n## {}\n\n",
            tag_report.link_id(),
            tag_report.display_name()
        ));
        output.push_str(&format!(
            "Number of occurrences found in the code: {}\n\n",
            tag_report.count()
        ));

        for file_report in tag_report.sorted_file_reports() {
            output.push_str(&format!(
                "### {} ({})\n\n",
                file_report.qualified_name(),
                file_report.count()
            ));
            for (line_number, comment) in file_report.comments() {
                output.push_str(&format!("- Line {}: {}\n", line_number, comment));
            }
            output.push('\n');
        }
    }

    output
}

#[derive(Serialize)]
struct JsonReport<'a> {
    scan_path: &'a Path,
    scan_time: DateTime<Utc>,
    files_scanned: usize,
    total_count: usize,
    tags: Vec<JsonTag<'a>>,
}

#[derive(Serialize)]
struct JsonTag<'a> {
    name: &'a str,
    link_id: &'a str,
    count: usize,
    tag_strings: &'a [String],
    files: Vec<JsonFile<'a>>,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    name: &'a str,
    path: PathBuf,
    slash_name: String,
    count: usize,
    comments: Vec<JsonComment<'a>>,
}

#[derive(Serialize)]
struct JsonComment<'a> {
    line: usize,
    comment: &'a str,
}

impl<'a> JsonFile<'a> {
    fn new(file_report: &'a FileReport) -> Self {
        Self {
            name: file_report.qualified_name(),
            path: file_report.path().to_path_buf(),
            slash_name: file_report.path_with_slashes(),
            count: file_report.count(),
            comments: file_report
                .comments()
                .map(|(line, comment)| JsonComment { line, comment })
                .collect(),
        }
    }
}

/// Format report as JSON
fn format_json(report: &TaglistReport) -> Result<String> {
    let json = JsonReport {
        scan_path: &report.scan_path,
        scan_time: report.scan_time,
        files_scanned: report.files_scanned,
        total_count: report.total_count(),
        tags: report
            .sorted_tag_reports()
            .into_iter()
            .map(|tag_report| JsonTag {
                name: tag_report.display_name(),
                link_id: tag_report.link_id(),
                count: tag_report.count(),
                tag_strings: tag_report.tag_strings(),
                files: tag_report
                    .sorted_file_reports()
                    .into_iter()
                    .map(JsonFile::new)
                    .collect(),
            })
            .collect(),
    };

    serde_json::to_string_pretty(&json).context("Failed to serialize report to JSON")
}
