mod types;

pub use types::*;

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

/// Capture groups every `regex_mapping` pattern must provide.
pub const REQUIRED_GROUPS: [&str; 3] = ["name", "season", "episode"];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    parse_config(&content).with_context(|| format!("Invalid config file: {:?}", path))
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./dubmerge.toml",
        "./config.toml",
        "~/.config/dubmerge/config.toml",
        "/etc/dubmerge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.general.allowed_extensions.is_empty() {
        anyhow::bail!("general.allowed_extensions cannot be empty");
    }

    if config.general.processing_interval_secs == 0 {
        anyhow::bail!("general.processing_interval_secs must be positive");
    }

    let sync = &config.sync;
    for (name, value) in [
        ("intro_frames", sync.intro_frames),
        ("intro_tolerance_frames", sync.intro_tolerance_frames),
        ("max_drift_frames", sync.max_drift_frames),
        ("sync_tolerance_secs", sync.sync_tolerance_secs),
        ("speed_tolerance_secs", sync.speed_tolerance_secs),
    ] {
        if !value.is_finite() || value <= 0.0 {
            anyhow::bail!("sync.{} must be a positive number, got {}", name, value);
        }
    }

    let mut titles = HashSet::new();
    for task in &config.tasks {
        validate_task(task)?;
        if !titles.insert(task.title.to_lowercase()) {
            anyhow::bail!("Duplicate task title '{}'", task.title);
        }
    }

    Ok(())
}

fn validate_task(task: &ShowTask) -> Result<()> {
    if task.title.trim().is_empty() {
        anyhow::bail!("Every task needs a title");
    }
    if task.source_path.as_os_str().is_empty() {
        anyhow::bail!("Task '{}' has no source_path", task.title);
    }
    if task.target_path.as_os_str().is_empty() {
        anyhow::bail!("Task '{}' has no target_path", task.title);
    }
    if !task.source_path.exists() {
        tracing::warn!("Source path of task '{}' does not exist: {:?}", task.title, task.source_path);
    }

    for pattern in &task.regex_mapping {
        let re = Regex::new(pattern)
            .with_context(|| format!("Task '{}' has an invalid regex: {}", task.title, pattern))?;
        let names: HashSet<&str> = re.capture_names().flatten().collect();
        for group in REQUIRED_GROUPS {
            if !names.contains(group) {
                anyhow::bail!(
                    "Regex '{}' of task '{}' lacks the named group '{}'",
                    pattern,
                    task.title,
                    group
                );
            }
        }
    }

    for mapping in &task.manual_mapping {
        if mapping.new_title.trim().is_empty() {
            anyhow::bail!("Manual mapping in task '{}' has an empty new_title", task.title);
        }
        if mapping.title.as_deref().unwrap_or("").is_empty()
            && mapping.path.as_deref().unwrap_or("").is_empty()
        {
            anyhow::bail!(
                "Manual mapping '{}' in task '{}' needs a title or path to match",
                mapping.new_title,
                task.title
            );
        }
        let m = mapping.speed_multiplier;
        if !m.is_finite() || m <= 0.5 || m > 100.0 {
            anyhow::bail!(
                "Manual mapping '{}' has speed_multiplier {} outside (0.5, 100]",
                mapping.new_title,
                m
            );
        }
        if !mapping.remove_frames.is_finite() || mapping.remove_frames < 0.0 {
            anyhow::bail!(
                "Manual mapping '{}' has negative remove_frames",
                mapping.new_title
            );
        }
    }

    Ok(())
}
