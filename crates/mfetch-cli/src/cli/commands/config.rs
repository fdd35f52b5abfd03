//! `mfetch config` – print the effective configuration.

use anyhow::{Context, Result};
use mfetch_core::config::{self, FetchConfig};
use std::process::ExitCode;

pub fn run_config(cfg: &FetchConfig) -> Result<ExitCode> {
    if let Ok(path) = config::config_path() {
        println!("# {}", path.display());
    }
    let text = toml::to_string_pretty(cfg).context("failed to render config")?;
    print!("{text}");
    Ok(ExitCode::SUCCESS)
}
