//! Fakes shared by the integration tests: a scripted extractor, an in-memory
//! HTTP client and a delivery that records what it received.

#![allow(dead_code)]

pub mod http_server;

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mfetch_core::config::FetchConfig;
use mfetch_core::extractor::{ExtractError, ExtractRequest, Extractor, RetrievalVariant};
use mfetch_core::fetcher::{ContentFetcher, FetchSettings};
use mfetch_core::http::{Headers, HttpClient, TextResponse, TransferError};
use mfetch_core::model::{Task, TaskId};
use mfetch_core::scheduler::{Delivery, EventSink, RunnerLimits, TaskEvent, TaskRunner};
use tokio::sync::mpsc;

/// Blocks extractor calls until opened.
#[derive(Default)]
pub struct Gate {
    open: Mutex<bool>,
    cv: Condvar,
    entered: AtomicUsize,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn wait(&self) {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cv.wait(open).unwrap();
        }
    }

    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }

    /// Calls currently or previously blocked on this gate.
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }
}

/// What the next extractor call does.
pub enum Step {
    /// Exit non-zero with this text.
    Fail(String),
    /// Write `bytes` bytes to `name` in the output directory.
    Write(&'static str, usize),
    /// Exit zero without producing a file.
    Nothing,
    Panic(&'static str),
    /// Wait for the gate, then write `video.mp4`.
    Gated(Arc<Gate>),
}

/// Replays steps in order; once they run out every call writes `video.mp4`.
#[derive(Default)]
pub struct ScriptedExtractor {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<(String, RetrievalVariant)>>,
    delay: Option<Duration>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedExtractor {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            ..Self::default()
        }
    }

    /// Every call sleeps for `delay` before acting.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(String, RetrievalVariant)> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of concurrent `extract` calls seen.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct Running<'a>(&'a AtomicUsize);

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Extractor for ScriptedExtractor {
    fn name(&self) -> &str {
        "scripted"
    }

    fn extract(&self, request: &ExtractRequest) -> Result<(), ExtractError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.url.clone(), request.variant));
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        let _running = Running(&self.running);
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Fail(text)) => Err(ExtractError::Failed(text)),
            Some(Step::Write(name, bytes)) => {
                std::fs::write(request.output_dir.join(name), vec![7u8; bytes])?;
                Ok(())
            }
            Some(Step::Nothing) => Ok(()),
            Some(Step::Panic(msg)) => panic!("{}", msg),
            Some(Step::Gated(gate)) => {
                gate.wait();
                std::fs::write(request.output_dir.join("video.mp4"), b"gated")?;
                Ok(())
            }
            None => {
                std::fs::write(request.output_dir.join("video.mp4"), b"default")?;
                Ok(())
            }
        }
    }
}

/// In-memory HTTP: pages for `fetch_text`, bodies for `download_to_file`.
/// `resolve_head` returns the mapped redirect or the URL itself.
#[derive(Default)]
pub struct StubHttp {
    pub pages: HashMap<String, String>,
    pub files: HashMap<String, Vec<u8>>,
    pub redirects: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StubHttp {
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    fn record(&self, url: &str) {
        self.requested.lock().unwrap().push(url.to_string());
    }
}

impl HttpClient for StubHttp {
    fn download_to_file(
        &self,
        url: &str,
        dest: &Path,
        _headers: &Headers,
        _timeout: Duration,
    ) -> Result<u64, TransferError> {
        self.record(url);
        let Some(body) = self.files.get(url) else {
            return Err(TransferError::Status {
                url: url.to_string(),
                status: 404,
            });
        };
        std::fs::write(dest, body).map_err(|source| TransferError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
        Ok(body.len() as u64)
    }

    fn fetch_text(
        &self,
        url: &str,
        _headers: &Headers,
        _timeout: Duration,
    ) -> Result<TextResponse, TransferError> {
        self.record(url);
        Ok(match self.pages.get(url) {
            Some(body) => TextResponse {
                status: 200,
                effective_url: url.to_string(),
                body: body.clone(),
            },
            None => TextResponse {
                status: 404,
                effective_url: url.to_string(),
                body: String::new(),
            },
        })
    }

    fn resolve_head(
        &self,
        url: &str,
        _headers: &Headers,
        _timeout: Duration,
    ) -> Result<String, TransferError> {
        self.record(url);
        Ok(self
            .redirects
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string()))
    }
}

/// Keeps a copy of every delivered file.
#[derive(Default)]
pub struct RecordingDelivery {
    delivered: Mutex<Vec<(TaskId, String, Vec<u8>)>>,
}

impl RecordingDelivery {
    pub fn delivered(&self) -> Vec<(TaskId, String, Vec<u8>)> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn deliver(&self, task: &Task, file: &Path) -> anyhow::Result<()> {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = tokio::fs::read(file).await?;
        self.delivered.lock().unwrap().push((task.id(), name, bytes));
        Ok(())
    }
}

/// Runner wired to the fakes, with workspaces under `temp_root` and no
/// free-space requirement.
pub struct Harness {
    pub runner: TaskRunner,
    pub extractor: Arc<ScriptedExtractor>,
    pub http: Arc<StubHttp>,
    pub delivery: Arc<RecordingDelivery>,
    pub events: mpsc::Receiver<TaskEvent>,
}

pub fn harness(
    extractor: ScriptedExtractor,
    http: StubHttp,
    temp_root: &Path,
    max_file_size_bytes: u64,
) -> Harness {
    let extractor = Arc::new(extractor);
    let http = Arc::new(http);
    let delivery = Arc::new(RecordingDelivery::default());
    let (tx, events) = mpsc::channel(256);

    let fetcher = ContentFetcher::new(
        extractor.clone(),
        http.clone(),
        FetchSettings::from_config(&FetchConfig::default()),
    );
    let limits = RunnerLimits {
        max_file_size_bytes,
        required_free_bytes: 0,
        temp_prefix: "mfetch_test_".to_string(),
        temp_root: Some(PathBuf::from(temp_root)),
    };
    let runner = TaskRunner::new(fetcher, delivery.clone(), EventSink::new(tx), limits);
    Harness {
        runner,
        extractor,
        http,
        delivery,
        events,
    }
}

/// Everything currently buffered on the event channel.
pub fn drain(events: &mut mpsc::Receiver<TaskEvent>) -> Vec<TaskEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

pub const MIB: u64 = 1024 * 1024;
