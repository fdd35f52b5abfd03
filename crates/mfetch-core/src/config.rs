use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const MIB: u64 = 1024 * 1024;

/// Extractor (yt-dlp) settings (optional `[extractor]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Executable to run; resolved through `PATH` when not absolute.
    #[serde(default = "default_extractor_binary")]
    pub binary: String,
    /// Netscape cookie file passed to the extractor. Ignored (with a warning) if missing.
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,
    /// Browser cookie source, e.g. `chrome`, `firefox:default-release`.
    #[serde(default)]
    pub cookies_from_browser: Option<String>,
    /// Hard deadline for one extractor run. None = rely on the socket timeout only.
    #[serde(default)]
    pub process_timeout_secs: Option<u64>,
}

fn default_extractor_binary() -> String {
    "yt-dlp".to_string()
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary: default_extractor_binary(),
            cookies_file: None,
            cookies_from_browser: None,
            process_timeout_secs: None,
        }
    }
}

/// Global configuration loaded from `~/.config/mfetch/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Number of workers; also the per-requester cap on queued + running tasks.
    pub max_concurrent_downloads: usize,
    /// Largest file that may be delivered, in MiB.
    pub max_file_size_mb: u64,
    /// Per-operation network/extraction timeout in seconds.
    pub download_timeout_secs: u64,
    /// Free space required in the temp area before a task starts, in MiB.
    pub required_free_space_mb: u64,
    /// Prefix of per-task scratch directories.
    pub temp_dir_prefix: String,
    /// Optional extractor section; if missing, built-in defaults are used.
    #[serde(default)]
    pub extractor: Option<ExtractorConfig>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 3,
            max_file_size_mb: 2048,
            download_timeout_secs: 600,
            required_free_space_mb: 500,
            temp_dir_prefix: "mfetch_".to_string(),
            extractor: None,
        }
    }
}

impl FetchConfig {
    pub fn extractor(&self) -> ExtractorConfig {
        self.extractor.clone().unwrap_or_default()
    }

    pub fn worker_count(&self) -> usize {
        self.max_concurrent_downloads.max(1)
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(MIB)
    }

    pub fn required_free_bytes(&self) -> u64 {
        self.required_free_space_mb.saturating_mul(MIB)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs.max(1))
    }

    /// Apply the deployment environment variables on top of the file values.
    ///
    /// `lookup` is usually `|k| std::env::var(k).ok()`; tests pass a map.
    /// Values that fail to parse are logged and ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(n) = parse_env(&lookup, "MAX_CONCURRENT_DOWNLOADS") {
            self.max_concurrent_downloads = n;
        }
        if let Some(n) = parse_env(&lookup, "MAX_FILE_SIZE_MB") {
            self.max_file_size_mb = n;
        }
        if let Some(n) = parse_env(&lookup, "DOWNLOAD_TIMEOUT_SECONDS") {
            self.download_timeout_secs = n;
        }

        let cookies_file = non_empty(lookup("YTDLP_COOKIES_FILE"));
        let cookies_from_browser = non_empty(lookup("YTDLP_COOKIES_FROM_BROWSER"));
        if cookies_file.is_some() || cookies_from_browser.is_some() {
            let mut extractor = self.extractor();
            if let Some(path) = cookies_file {
                extractor.cookies_file = Some(PathBuf::from(path));
            }
            if let Some(spec) = cookies_from_browser {
                extractor.cookies_from_browser = Some(spec);
            }
            self.extractor = Some(extractor);
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = non_empty(lookup(key))?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// `load_or_init` followed by the process environment overrides.
pub fn load_effective() -> Result<FetchConfig> {
    let mut cfg = load_or_init()?;
    cfg.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_values() {
        let cfg = FetchConfig::default();
        assert_eq!(cfg.max_concurrent_downloads, 3);
        assert_eq!(cfg.max_file_size_mb, 2048);
        assert_eq!(cfg.download_timeout_secs, 600);
        assert_eq!(cfg.required_free_space_mb, 500);
        assert_eq!(cfg.extractor().binary, "yt-dlp");
        assert_eq!(cfg.max_file_size_bytes(), 2048 * 1024 * 1024);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = FetchConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: FetchConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_extractor_section() {
        let toml = r#"
            max_concurrent_downloads = 2
            max_file_size_mb = 50
            download_timeout_secs = 30
            required_free_space_mb = 100
            temp_dir_prefix = "job_"

            [extractor]
            cookies_file = "/srv/cookies.txt"
            process_timeout_secs = 900
        "#;
        let cfg: FetchConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.worker_count(), 2);
        let ex = cfg.extractor();
        assert_eq!(ex.binary, "yt-dlp");
        assert_eq!(ex.cookies_file.as_deref(), Some(std::path::Path::new("/srv/cookies.txt")));
        assert_eq!(ex.process_timeout_secs, Some(900));
        assert!(ex.cookies_from_browser.is_none());
    }

    #[test]
    fn env_overrides_replace_numbers_and_cookies() {
        let mut cfg = FetchConfig::default();
        cfg.apply_env_overrides(env(&[
            ("MAX_CONCURRENT_DOWNLOADS", "5"),
            ("MAX_FILE_SIZE_MB", " 50 "),
            ("YTDLP_COOKIES_FROM_BROWSER", "firefox:default-release"),
        ]));
        assert_eq!(cfg.max_concurrent_downloads, 5);
        assert_eq!(cfg.max_file_size_mb, 50);
        assert_eq!(cfg.download_timeout_secs, 600);
        assert_eq!(
            cfg.extractor().cookies_from_browser.as_deref(),
            Some("firefox:default-release")
        );
    }

    #[test]
    fn env_overrides_ignore_garbage_and_blanks() {
        let mut cfg = FetchConfig::default();
        cfg.apply_env_overrides(env(&[
            ("MAX_CONCURRENT_DOWNLOADS", "many"),
            ("YTDLP_COOKIES_FILE", "   "),
        ]));
        assert_eq!(cfg, FetchConfig::default());
    }

    #[test]
    fn worker_count_is_at_least_one() {
        let cfg = FetchConfig {
            max_concurrent_downloads: 0,
            ..FetchConfig::default()
        };
        assert_eq!(cfg.worker_count(), 1);
    }
}
