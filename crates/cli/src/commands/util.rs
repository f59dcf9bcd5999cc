use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use magic_core::config::MagicConfig;
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks warn/debug/trace.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed (e.g. when called twice from tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load the optional JSON config and merge command-line overrides on top.
pub fn resolve_config(
    config_path: Option<&Path>,
    magic_files: &[PathBuf],
    no_builtin: bool,
) -> Result<MagicConfig> {
    let mut config = match config_path {
        Some(path) => MagicConfig::load(path)
            .with_context(|| format!("Failed to load config at {}", path.display()))?,
        None => MagicConfig::default(),
    };
    config.magic_files.extend(magic_files.iter().cloned());
    if no_builtin {
        config.include_builtin = false;
    }
    Ok(config)
}

/// Human-readable report line for one probed file.
pub fn format_report(path: &str, description: &str) -> String {
    format!("file {path} is type {description}")
}
