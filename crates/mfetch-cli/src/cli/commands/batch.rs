//! `mfetch batch` – download every URL listed in a file.

use anyhow::{Context, Result};
use mfetch_core::config::FetchConfig;
use mfetch_core::platform::find_first_url;
use std::path::Path;
use std::process::ExitCode;

use super::session::run_session;
use crate::cli::FetchArgs;

/// First URL of every non-blank, non-comment line.
pub(crate) fn urls_from_list(text: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match find_first_url(line) {
            Some(url) => urls.push(url.to_string()),
            None => tracing::warn!(line = n + 1, "no URL on line, skipped"),
        }
    }
    urls
}

pub async fn run_batch(cfg: &FetchConfig, file: &Path, fetch: &FetchArgs) -> Result<ExitCode> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let urls = urls_from_list(&text);
    if urls.is_empty() {
        println!("No URLs in {}.", file.display());
        return Ok(ExitCode::SUCCESS);
    }

    let summary = run_session(cfg, urls, fetch).await?;
    println!(
        "{} completed, {} failed, {} rejected",
        summary.completed(),
        summary.failed(),
        summary.rejected.len()
    );
    for outcome in summary.outcomes.iter().filter(|o| o.failure.is_some()) {
        let category = outcome
            .failure
            .as_ref()
            .map(|f| f.category.as_str())
            .unwrap_or("generic");
        println!("  #{} {} [{}]", outcome.task_id, outcome.url, category);
    }
    Ok(summary.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_first_url_per_line() {
        let text = "\
# weekend list
https://youtu.be/a

see https://www.tiktok.com/@x/video/1 and https://youtu.be/ignored
no link here
  https://cdn.example.com/a.mp3  
";
        assert_eq!(
            urls_from_list(text),
            vec![
                "https://youtu.be/a",
                "https://www.tiktok.com/@x/video/1",
                "https://cdn.example.com/a.mp3",
            ]
        );
    }
}
