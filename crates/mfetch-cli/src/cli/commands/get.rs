//! `mfetch get` – download one URL.

use anyhow::{Context, Result};
use mfetch_core::config::FetchConfig;
use mfetch_core::platform::validate_url_input;
use std::process::ExitCode;

use super::session::run_session;
use crate::cli::FetchArgs;

pub async fn run_get(cfg: &FetchConfig, url: &str, fetch: &FetchArgs) -> Result<ExitCode> {
    let url = url.trim();
    validate_url_input(url).with_context(|| format!("invalid URL {url:?}"))?;
    let summary = run_session(cfg, vec![url.to_string()], fetch).await?;
    Ok(summary.exit_code())
}
