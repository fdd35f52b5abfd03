//! Per-attempt extractor options.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{ExtractorConfig, FetchConfig};
use crate::http::DESKTOP_UA;
use crate::model::MediaMode;

/// Output file name pattern, relative to the task workspace.
pub const OUTPUT_TEMPLATE: &str = "%(title).80s_%(id)s.%(ext)s";

const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/121.0.0.0 Mobile Safari/537.36";
const TIKTOK_REFERER: &str = "https://www.tiktok.com/";

const APP_INFO: &[&str] = &[
    "musical_ly/35.1.3/2023501030/0",
    "musical_ly/36.7.4/2023607040/0",
    "musical_ly/37.1.4/2023701040/0",
];
const API_HOSTNAMES: &[&str] = &[
    "api16-normal-c-useast1a.tiktokv.com",
    "api22-normal-c-useast1a.tiktokv.com",
    "api16-normal-useast5.us.tiktokv.com",
];

/// How the extractor talks to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetrievalVariant {
    /// Regular web page extraction.
    Web,
    /// Native mobile-app API client.
    App,
}

impl RetrievalVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            RetrievalVariant::Web => "web",
            RetrievalVariant::App => "app",
        }
    }
}

/// `extractor:key=v1,v2,...` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorArg {
    pub extractor: String,
    pub key: String,
    pub values: Vec<String>,
}

impl ExtractorArg {
    fn new(extractor: &str, key: &str, values: &[&str]) -> Self {
        Self {
            extractor: extractor.to_string(),
            key: key.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Browser cookie source: `browser[:profile[:keyring[:container]]]`.
///
/// Empty segments are skipped, so `edge::Profile 1` names profile `Profile 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserCookies {
    pub browser: String,
    pub profile: Option<String>,
    pub keyring: Option<String>,
    pub container: Option<String>,
}

impl BrowserCookies {
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(':').map(str::trim);
        let browser = parts.next().filter(|b| !b.is_empty())?.to_string();
        let mut rest = parts.take(3).filter(|p| !p.is_empty()).map(str::to_string);
        Some(Self {
            browser,
            profile: rest.next(),
            keyring: rest.next(),
            container: rest.next(),
        })
    }

    /// yt-dlp command-line form `BROWSER[+KEYRING][:PROFILE][::CONTAINER]`.
    pub fn render(&self) -> String {
        let mut out = self.browser.clone();
        if let Some(keyring) = &self.keyring {
            out.push('+');
            out.push_str(keyring);
        }
        if let Some(profile) = &self.profile {
            out.push(':');
            out.push_str(profile);
        }
        if let Some(container) = &self.container {
            out.push_str("::");
            out.push_str(container);
        }
        out
    }
}

/// Cookie sources handed to every extractor run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub cookies_file: Option<PathBuf>,
    pub browser: Option<BrowserCookies>,
}

impl Credentials {
    /// Keep the cookie file only if it exists; parse the browser spec.
    pub fn resolve(cfg: &ExtractorConfig) -> Self {
        let cookies_file = cfg.cookies_file.clone().filter(|path| {
            let exists = path.exists();
            if !exists {
                tracing::warn!(path = %path.display(), "cookie file is set but does not exist");
            }
            exists
        });
        let browser = cfg
            .cookies_from_browser
            .as_deref()
            .and_then(BrowserCookies::parse);
        Self {
            cookies_file,
            browser,
        }
    }
}

/// Values shared by all attempts, taken from the configuration once.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractSettings {
    pub socket_timeout: Duration,
    pub max_file_size_bytes: u64,
    pub credentials: Credentials,
}

impl ExtractSettings {
    pub fn from_config(cfg: &FetchConfig) -> Self {
        Self {
            socket_timeout: cfg.download_timeout(),
            max_file_size_bytes: cfg.max_file_size_bytes(),
            credentials: Credentials::resolve(&cfg.extractor()),
        }
    }
}

/// Options for one extractor run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub output_template: PathBuf,
    pub no_playlist: bool,
    pub socket_timeout: Duration,
    pub retries: u32,
    pub max_filesize_bytes: u64,
    pub format: String,
    pub merge_output_format: Option<String>,
    pub user_agent: String,
    pub referer: Option<String>,
    pub extractor_retries: Option<u32>,
    pub extractor_args: Vec<ExtractorArg>,
    pub check_certificates: bool,
    pub quiet: bool,
    pub cookies_file: Option<PathBuf>,
    pub cookies_from_browser: Option<BrowserCookies>,
}

impl ExtractOptions {
    pub fn new(
        settings: &ExtractSettings,
        workspace: &Path,
        mode: MediaMode,
        variant: RetrievalVariant,
    ) -> Self {
        let (format, merge_output_format) = match mode {
            MediaMode::Audio => ("bestaudio[ext=m4a]/bestaudio/best", None),
            MediaMode::Video => ("bestvideo+bestaudio/best", Some("mp4".to_string())),
        };

        let mut opts = Self {
            output_template: workspace.join(OUTPUT_TEMPLATE),
            no_playlist: true,
            socket_timeout: settings.socket_timeout,
            retries: 3,
            max_filesize_bytes: settings.max_file_size_bytes,
            format: format.to_string(),
            merge_output_format,
            user_agent: DESKTOP_UA.to_string(),
            referer: None,
            extractor_retries: None,
            extractor_args: Vec::new(),
            check_certificates: false,
            quiet: true,
            cookies_file: settings.credentials.cookies_file.clone(),
            cookies_from_browser: settings.credentials.browser.clone(),
        };

        if variant == RetrievalVariant::App {
            opts.user_agent = ANDROID_UA.to_string();
            opts.referer = Some(TIKTOK_REFERER.to_string());
            opts.extractor_retries = Some(5);
            opts.extractor_args = vec![
                ExtractorArg::new("tiktok", "app_info", APP_INFO),
                ExtractorArg::new("tiktok", "api_hostname", API_HOSTNAMES),
            ];
        }
        opts
    }
}
