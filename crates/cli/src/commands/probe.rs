use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use magic_core::config::MagicConfig;
use magic_core::rules::{Detection, MagicDatabase, UNKNOWN_DESCRIPTION};

use crate::commands::{format_report, resolve_config};

/// Inputs for a single probe run.
#[derive(Debug, Clone, Default)]
pub struct ProbeArgs {
    pub path: PathBuf,
    pub magic_files: Vec<PathBuf>,
    pub no_builtin: bool,
    pub config: Option<PathBuf>,
    pub json: bool,
}

/// Compile the rule database described by `config`.
pub fn build_database(config: &MagicConfig) -> Result<MagicDatabase> {
    let registry = config.registry();
    if registry.is_empty() {
        return Err(anyhow!("No magic rules configured; drop --no-builtin or pass --magic"));
    }
    registry.build_with(config.render_options()).context("Failed to compile magic rules")
}

/// Open `path` and run the database against it.
pub fn probe_file(db: &MagicDatabase, path: &Path) -> Result<Option<Detection>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file {}", path.display()))?;
    db.detect(&file).with_context(|| format!("Failed to probe file {}", path.display()))
}

/// Probe one file and print the result.
pub fn probe_command(args: &ProbeArgs) -> Result<()> {
    let config = resolve_config(args.config.as_deref(), &args.magic_files, args.no_builtin)?;
    let db = build_database(&config)?;
    tracing::debug!(rules = db.rule_count(), groups = db.groups().len(), "rule database ready");

    let detection = probe_file(&db, &args.path)?;

    if args.json {
        let serialized = serde_json::to_string_pretty(&detection)
            .context("Failed to serialize detection to JSON")?;
        println!("{}", serialized);
        return Ok(());
    }

    let description = detection
        .map(|d| d.description)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| UNKNOWN_DESCRIPTION.to_string());
    println!("{}", format_report(&args.path.display().to_string(), &description));
    Ok(())
}
