//! Run a list of URLs through one worker pool and print events as they arrive.

use anyhow::{Context, Result};
use mfetch_core::classify::FailureReport;
use mfetch_core::config::FetchConfig;
use mfetch_core::error::SubmitError;
use mfetch_core::model::{DownloadStatus, TaskId};
use mfetch_core::scheduler::{CopyToDir, EventSink, TaskEvent, TaskRunner, WorkerPool};
use std::collections::{HashMap, VecDeque};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cli::format::format_duration;
use crate::cli::FetchArgs;

/// Wait before retrying admission when none of our tasks is in flight yet
/// the requester is still at the cap (slots are released just after the
/// final event).
const ADMISSION_RETRY: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct Outcome {
    pub task_id: TaskId,
    pub url: String,
    pub status: DownloadStatus,
    pub failure: Option<FailureReport>,
}

#[derive(Debug, Default)]
pub struct Summary {
    pub outcomes: Vec<Outcome>,
    pub rejected: Vec<(String, SubmitError)>,
}

impl Summary {
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == DownloadStatus::Completed)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.completed()
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.failed() == 0 && self.rejected.is_empty() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

struct Tracked {
    url: String,
    started: Option<Instant>,
}

fn print_event(event: &TaskEvent, tracked: &mut Tracked) {
    match event.status {
        DownloadStatus::Downloading => {
            tracked.started = Some(Instant::now());
            println!("#{} downloading {}", event.task_id, tracked.url);
        }
        DownloadStatus::Sending => println!("#{} saving", event.task_id),
        DownloadStatus::Completed => {
            let took = tracked
                .started
                .map(|s| format_duration(s.elapsed()))
                .unwrap_or_else(|| "-".to_string());
            println!("#{} completed in {}", event.task_id, took);
        }
        DownloadStatus::Failed => match &event.failure {
            Some(report) => println!(
                "#{} failed [{}]: {}\n    {}",
                event.task_id,
                report.category,
                report.category.summary(),
                report.diagnostic
            ),
            None => println!("#{} failed", event.task_id),
        },
        DownloadStatus::Queued => {}
    }
}

pub async fn run_session(
    cfg: &FetchConfig,
    urls: Vec<String>,
    fetch: &FetchArgs,
) -> Result<Summary> {
    let out_dir = match &fetch.out {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("cannot determine current directory")?,
    };

    let (tx, mut rx) = tokio::sync::mpsc::channel::<TaskEvent>(64);
    let runner = TaskRunner::from_config(cfg, Arc::new(CopyToDir::new(out_dir)), EventSink::new(tx));
    let pool = WorkerPool::start(runner, cfg.worker_count());

    let mut pending: VecDeque<String> = urls.into();
    let mut tracked: HashMap<TaskId, Tracked> = HashMap::new();
    let mut summary = Summary::default();

    loop {
        while let Some(url) = pending.front() {
            match pool.submit(fetch.requester, url, fetch.mode) {
                Ok(id) => {
                    println!("#{} queued ({})", id, fetch.mode);
                    tracked.insert(
                        id,
                        Tracked {
                            url: url.clone(),
                            started: None,
                        },
                    );
                    pending.pop_front();
                }
                Err(SubmitError::QuotaExceeded { .. }) => break,
                Err(e) => {
                    println!("rejected {}: {}", url, e);
                    if let Some(url) = pending.pop_front() {
                        summary.rejected.push((url, e));
                    }
                }
            }
        }

        if tracked.is_empty() {
            if pending.is_empty() {
                break;
            }
            tokio::time::sleep(ADMISSION_RETRY).await;
            continue;
        }

        let Some(event) = rx.recv().await else {
            break;
        };
        let Some(entry) = tracked.get_mut(&event.task_id) else {
            continue;
        };
        print_event(&event, entry);
        if event.status.is_terminal() {
            if let Some(done) = tracked.remove(&event.task_id) {
                summary.outcomes.push(Outcome {
                    task_id: event.task_id,
                    url: done.url,
                    status: event.status,
                    failure: event.failure,
                });
            }
        }
    }

    pool.shutdown().await;
    Ok(summary)
}
