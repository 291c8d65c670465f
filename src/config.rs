use crate::models::{default_tag_classes, Config, TagClassConfig};
use crate::scanner::{encoding_for_label, ScanOptions};
use crate::tag_class::TagClass;
use crate::tags::{Locale, Tag, TagError};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

const CONFIG_FILE_NAME: &str = ".taglistrc";

/// Load configuration from file or use defaults
///
/// Search order:
/// 1. Custom path if provided via --config
/// 2. .taglistrc in current directory
/// 3. ~/.taglistrc in home directory
/// 4. Built-in defaults
pub fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    // If custom path provided, use it exclusively
    if let Some(path) = custom_path {
        return load_config_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    let current_config = PathBuf::from(CONFIG_FILE_NAME);
    if current_config.exists() {
        match load_config_from_file(&current_config) {
            Ok(config) => return Ok(config),
            Err(err) => warn!("Ignoring {}: {:#}", current_config.display(), err),
        }
    }

    if let Some(home_config) = get_home_config_path() {
        if home_config.exists() {
            match load_config_from_file(&home_config) {
                Ok(config) => return Ok(config),
                Err(err) => warn!("Ignoring {}: {:#}", home_config.display(), err),
            }
        }
    }

    Ok(Config::default())
}

/// Load config from a specific file
fn load_config_from_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

/// Get path to home directory config file
fn get_home_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// Save a config to a file (useful for creating example configs)
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let toml_string = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Build the tag classes to scan for.
///
/// Link ids are `tag_class_1`, `tag_class_2`, ... in configuration order.
/// A tag with an unknown match type is logged and left out of its class; a
/// regex that does not compile fails the whole build.
pub fn build_tag_classes(config: &Config) -> Result<Vec<TagClass>, TagError> {
    let defaults;
    let class_configs: &[TagClassConfig] = if config.tag_classes.is_empty() {
        defaults = default_tag_classes();
        &defaults
    } else {
        &config.tag_classes
    };

    let mut classes = Vec::with_capacity(class_configs.len());
    for (i, class_config) in class_configs.iter().enumerate() {
        let mut class = TagClass::new(
            class_config.display_name.clone(),
            format!("tag_class_{}", i + 1),
        );

        for tag_config in &class_config.tags {
            match Tag::from_config(tag_config.match_type.as_deref(), &tag_config.match_string) {
                Ok(tag) => class.add_tag(tag),
                Err(err @ TagError::InvalidMatchKind { .. }) => error!(
                    "{}; skipping tag '{}' of tag class '{}'",
                    err, tag_config.match_string, class_config.display_name
                ),
                Err(err) => return Err(err),
            }
        }

        classes.push(class);
    }

    Ok(classes)
}

/// Scan settings from the configuration
pub fn build_scan_options(config: &Config) -> Result<ScanOptions, TagError> {
    let encoding = encoding_for_label(config.encoding.as_deref())?;
    if encoding.is_none() {
        warn!("File encoding has not been set, using UTF-8");
    }

    Ok(ScanOptions {
        multiple_line_comments: config.multiple_line_comments,
        empty_comments: config.empty_comments,
        encoding,
        locale: Locale::parse(&config.locale),
        no_comment_text: config.no_comment_text.clone(),
    })
}
