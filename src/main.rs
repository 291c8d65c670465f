use anyhow::{Context, Result};
use clap::Parser;
use taglist::reporter::RenderOptions;
use taglist::{cli, config, filters, logging, models, reporter, scanner};
use tracing::{debug, info};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    match cli.command {
        cli::Commands::Scan(args) => scan_command(args)?,
        cli::Commands::InitConfig(args) => init_config_command(args)?,
    }

    Ok(())
}

fn scan_command(args: cli::ScanArgs) -> Result<()> {
    logging::init_logging(args.verbose)?;
    debug!("Scanning: {}", args.path.display());

    // Load configuration, command line flags win
    let mut config =
        config::load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if args.encoding.is_some() {
        config.encoding = args.encoding.clone();
    }
    if let Some(ref locale) = args.locale {
        config.locale = locale.clone();
    }
    if args.no_multiline {
        config.multiple_line_comments = false;
    }
    if args.no_empty_comments {
        config.empty_comments = false;
    }
    config.show_empty_details |= args.show_empty_details;
    config.skip_empty_report |= args.skip_empty_report;

    let tag_classes =
        config::build_tag_classes(&config).context("Invalid tag class configuration")?;
    let options = config::build_scan_options(&config).context("Invalid scan configuration")?;

    debug!(
        "Using tag classes: {:?}",
        tag_classes.iter().map(|tc| tc.display_name()).collect::<Vec<_>>()
    );

    // Find and scan files
    let files = scanner::find_files(
        &args.path,
        &config.includes,
        &config.excludes,
        &config.ignored_dirs,
    )
    .context("Failed to find files to scan")?;
    debug!("Found {} files to scan", files.len());

    let mut scanner = scanner::Scanner::new(tag_classes, options);
    scanner.scan_files(&files);
    let files_scanned = scanner.files_scanned();
    let mut tag_reports = scanner.finish();

    // Apply filters
    if let Some(ref tag_class) = args.tag_class {
        debug!("Filtering by tag class: {}", tag_class);
        tag_reports = filters::filter_by_tag_class(tag_reports, tag_class);
    }

    if let Some(ref file) = args.file {
        debug!("Filtering by file: {}", file);
        tag_reports = filters::filter_by_file(tag_reports, file);
    }

    let report = models::TaglistReport::new(tag_reports, args.path.clone(), files_scanned);

    if config.skip_empty_report && report.is_empty() {
        info!("No tags found, skipping report");
        return Ok(());
    }

    let render_options = RenderOptions {
        show_empty_details: config.show_empty_details,
    };
    reporter::generate_report(&report, args.format, args.output.as_deref(), render_options)
        .context("Failed to generate report")?;

    Ok(())
}

fn init_config_command(args: cli::InitConfigArgs) -> Result<()> {
    config::save_config(&models::Config::default(), &args.path)?;
    println!("Configuration written to {}", args.path.display());
    Ok(())
}
