use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use filemagic::{init_tracing, probe_command, ProbeArgs};

/// Identify a file's type from its magic numbers.
///
/// This CLI is a thin wrapper around `magic-core` (exposed in code as
/// `magic_core`); rule compilation and probing live in the library.
#[derive(Parser, Debug)]
#[command(
    name = "filemagic",
    version,
    about = "Identify file types by magic numbers",
    long_about = None
)]
struct Cli {
    /// File to identify.
    path: PathBuf,

    /// Additional magic rule file, probed after the built-in rules. Repeatable.
    #[arg(long = "magic", value_name = "FILE")]
    magic: Vec<PathBuf>,

    /// Skip the built-in rule groups.
    #[arg(long, default_value_t = false)]
    no_builtin: bool,

    /// JSON config file (include_builtin, magic_files, max_string_len).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit the detection as JSON instead of a report line.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    probe_command(&ProbeArgs {
        path: cli.path,
        magic_files: cli.magic,
        no_builtin: cli.no_builtin,
        config: cli.config,
        json: cli.json,
    })
}
