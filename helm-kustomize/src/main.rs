//! Helm post-renderer entry point.
//!
//! Reads the rendered manifest stream from stdin and writes the kustomized
//! stream to stdout, e.g. `helm install app ./chart --post-renderer helm-kustomize`.

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use helm_kustomize::exit_codes;
use helm_kustomize::io::build::CommandBuilder;
use helm_kustomize::io::config::{RenderConfig, load_config};
use helm_kustomize::logging;
use helm_kustomize::render::render;

#[derive(Parser)]
#[command(
    name = "helm-kustomize",
    version,
    about = "Helm post-renderer applying kustomize overlays embedded in the chart"
)]
struct Cli {
    /// TOML config file. A missing file falls back to defaults.
    #[arg(long, env = "HELM_KUSTOMIZE_CONFIG")]
    config: Option<PathBuf>,

    /// Build command, whitespace separated; the sandbox path is appended.
    #[arg(long, value_name = "COMMAND")]
    kustomize_command: Option<String>,

    /// Abort the build after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(exit_codes::FAILED);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    let mut input = Vec::new();
    std::io::stdin()
        .lock()
        .read_to_end(&mut input)
        .context("failed to read input")?;

    let output = render(&input, &CommandBuilder::new(config.build))?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&output)
        .and_then(|()| stdout.flush())
        .context("failed to write output")?;
    Ok(())
}

/// Load the config file, then apply command-line overrides.
fn resolve_config(cli: &Cli) -> Result<RenderConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RenderConfig::default(),
    };
    if let Some(command) = &cli.kustomize_command {
        config.build.command = command.split_whitespace().map(str::to_string).collect();
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        config.build.timeout_secs = timeout_secs;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}
