//! [`Extractor`] backed by the `yt-dlp` executable.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use super::{ExtractError, ExtractOptions, ExtractRequest, Extractor};
use crate::config::ExtractorConfig;

/// Stderr lines kept for the failure message.
const STDERR_TAIL: usize = 200;
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    binary: String,
    process_timeout: Option<Duration>,
}

impl YtDlpExtractor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            process_timeout: None,
        }
    }

    pub fn from_config(cfg: &ExtractorConfig) -> Self {
        Self {
            binary: cfg.binary.clone(),
            process_timeout: cfg.process_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Kill the process if it runs longer than `timeout`.
    pub fn with_process_timeout(mut self, timeout: Duration) -> Self {
        self.process_timeout = Some(timeout);
        self
    }

    /// Command-line arguments for one run, URL last.
    pub fn build_args(url: &str, opts: &ExtractOptions) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        if opts.quiet {
            args.extend(["--quiet", "--no-warnings"].map(String::from));
        }
        if !opts.check_certificates {
            args.push("--no-check-certificates".into());
        }
        if opts.no_playlist {
            args.push("--no-playlist".into());
        }
        args.push("--user-agent".into());
        args.push(opts.user_agent.clone());
        if let Some(referer) = &opts.referer {
            args.push("--add-header".into());
            args.push(format!("Referer:{referer}"));
        }
        args.push("-o".into());
        args.push(opts.output_template.to_string_lossy().into_owned());
        args.push("--socket-timeout".into());
        args.push(opts.socket_timeout.as_secs().to_string());
        args.push("--retries".into());
        args.push(opts.retries.to_string());
        args.push("--max-filesize".into());
        args.push(opts.max_filesize_bytes.to_string());
        args.push("-f".into());
        args.push(opts.format.clone());
        if let Some(merge) = &opts.merge_output_format {
            args.push("--merge-output-format".into());
            args.push(merge.clone());
        }
        if let Some(n) = opts.extractor_retries {
            args.push("--extractor-retries".into());
            args.push(n.to_string());
        }
        // One flag per extractor; a repeated flag replaces the earlier one.
        let mut grouped: Vec<(&str, Vec<String>)> = Vec::new();
        for arg in &opts.extractor_args {
            let pair = format!("{}={}", arg.key, arg.values.join(","));
            match grouped.iter_mut().find(|(name, _)| *name == arg.extractor) {
                Some((_, pairs)) => pairs.push(pair),
                None => grouped.push((arg.extractor.as_str(), vec![pair])),
            }
        }
        for (extractor, pairs) in grouped {
            args.push("--extractor-args".into());
            args.push(format!("{extractor}:{}", pairs.join(";")));
        }
        if let Some(path) = &opts.cookies_file {
            args.push("--cookies".into());
            args.push(path.to_string_lossy().into_owned());
        }
        if let Some(browser) = &opts.cookies_from_browser {
            args.push("--cookies-from-browser".into());
            args.push(browser.render());
        }
        args.push("--".into());
        args.push(url.to_string());
        args
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, ExtractError> {
        let Some(timeout) = self.process_timeout else {
            return Ok(child.wait()?);
        };
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                tracing::error!(
                    "{} timed out after {}s, killing",
                    self.binary,
                    timeout.as_secs()
                );
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExtractError::TimedOut(timeout.as_secs()));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl Extractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    fn extract(&self, request: &ExtractRequest) -> Result<(), ExtractError> {
        let args = Self::build_args(&request.url, &request.options);
        tracing::debug!(
            url = %request.url,
            variant = request.variant.as_str(),
            "running {}",
            self.binary
        );

        let mut child = Command::new(&self.binary)
            .args(&args)
            .current_dir(&request.output_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExtractError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        let tail = Arc::new(Mutex::new(VecDeque::<String>::new()));
        let reader = child.stderr.take().map(|stderr| {
            let tail = Arc::clone(&tail);
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    tracing::trace!("yt-dlp stderr: {}", line);
                    let mut lines = tail.lock().unwrap_or_else(PoisonError::into_inner);
                    lines.push_back(line);
                    if lines.len() > STDERR_TAIL {
                        lines.pop_front();
                    }
                }
            })
        });

        let status = self.wait(&mut child)?;
        if let Some(handle) = reader {
            let _ = handle.join();
        }
        if status.success() {
            return Ok(());
        }

        let lines: Vec<String> = tail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        Err(ExtractError::Failed(summarize_stderr(&lines, status)))
    }
}

/// Failure text from stderr: the `ERROR:` lines if any, else the last line,
/// else the exit status.
pub fn summarize_stderr(lines: &[String], status: ExitStatus) -> String {
    let errors: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| l.starts_with("ERROR:"))
        .collect();
    if !errors.is_empty() {
        return errors.join("\n");
    }
    lines
        .iter()
        .rev()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("yt-dlp exited with {status}"))
}
