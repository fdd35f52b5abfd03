//! libcurl implementation of [`HttpClient`].

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use curl::easy::{Easy, List};

use super::{Headers, HttpClient, TextResponse, TransferError, DESKTOP_UA};

#[derive(Debug, Clone)]
pub struct CurlHttp {
    connect_timeout: Duration,
    max_redirects: u32,
    user_agent: String,
}

impl Default for CurlHttp {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            max_redirects: 10,
            user_agent: DESKTOP_UA.to_string(),
        }
    }
}

impl CurlHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Base handle: redirects, timeouts, default UA, then caller headers
    /// (a caller `User-Agent` header wins over the default).
    fn easy(&self, url: &str, headers: &Headers, timeout: Duration) -> Result<Easy, TransferError> {
        let mut easy = Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(self.max_redirects)?;
        easy.connect_timeout(self.connect_timeout.min(timeout))?;
        easy.timeout(timeout)?;
        easy.useragent(&self.user_agent)?;

        if !headers.is_empty() {
            let mut list = List::new();
            for (k, v) in headers {
                list.append(&format!("{}: {}", k.trim(), v.trim()))?;
            }
            easy.http_headers(list)?;
        }
        Ok(easy)
    }

    fn effective_url(easy: &mut Easy, fallback: &str) -> Result<String, TransferError> {
        Ok(easy
            .effective_url()?
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string()))
    }
}

fn check_status(url: &str, code: u32) -> Result<(), TransferError> {
    if (200..300).contains(&code) {
        Ok(())
    } else {
        Err(TransferError::Status {
            url: url.to_string(),
            status: code,
        })
    }
}

impl HttpClient for CurlHttp {
    fn download_to_file(
        &self,
        url: &str,
        dest: &Path,
        headers: &Headers,
        timeout: Duration,
    ) -> Result<u64, TransferError> {
        let io_err = |source| TransferError::Io {
            path: dest.to_path_buf(),
            source,
        };
        let mut file = fs::File::create(dest).map_err(io_err)?;
        let mut easy = self.easy(url, headers, timeout)?;
        easy.fail_on_error(true)?;

        let mut written: u64 = 0;
        let mut write_error: Option<std::io::Error> = None;
        let performed = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match file.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    tracing::warn!("direct download write failed: {}", e);
                    write_error = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            transfer.perform()
        };

        let result = match (performed, write_error) {
            (_, Some(e)) => Err(io_err(e)),
            (Err(e), None) if e.is_http_returned_error() => {
                let status = easy.response_code().unwrap_or(0);
                Err(TransferError::Status {
                    url: url.to_string(),
                    status,
                })
            }
            (Err(e), None) => Err(TransferError::Curl(e)),
            (Ok(()), None) => {
                let code = easy.response_code()?;
                check_status(url, code).and_then(|()| file.flush().map_err(io_err))
            }
        };

        match result {
            Ok(()) => Ok(written),
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(dest);
                Err(e)
            }
        }
    }

    fn fetch_text(
        &self,
        url: &str,
        headers: &Headers,
        timeout: Duration,
    ) -> Result<TextResponse, TransferError> {
        let mut easy = self.easy(url, headers, timeout)?;
        easy.accept_encoding("")?;

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        Ok(TextResponse {
            status: easy.response_code()?,
            effective_url: Self::effective_url(&mut easy, url)?,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    fn resolve_head(
        &self,
        url: &str,
        headers: &Headers,
        timeout: Duration,
    ) -> Result<String, TransferError> {
        let mut easy = self.easy(url, headers, timeout)?;
        easy.nobody(true)?;
        easy.perform()?;
        let code = easy.response_code()?;
        check_status(url, code)?;
        Self::effective_url(&mut easy, url)
    }
}
