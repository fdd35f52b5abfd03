//! Hand-off of a finished file to whoever asked for it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::model::Task;

/// Receives the produced file while it still exists in the task workspace.
/// The file is deleted with the workspace once `deliver` returns.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, task: &Task, file: &Path) -> Result<()>;
}

/// Copies results into a directory, never overwriting an existing file.
#[derive(Debug, Clone)]
pub struct CopyToDir {
    dir: PathBuf,
}

impl CopyToDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// `name`, or `stem (n).ext` for the first n that is free in `dir`.
fn free_target(dir: &Path, name: &str) -> PathBuf {
    let first = dir.join(name);
    if !first.exists() {
        return first;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

#[async_trait]
impl Delivery for CopyToDir {
    async fn deliver(&self, task: &Task, file: &Path) -> Result<()> {
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .context("output file has no name")?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let target = free_target(&self.dir, name);
        let bytes = tokio::fs::copy(file, &target)
            .await
            .with_context(|| format!("failed to copy to {}", target.display()))?;
        tracing::info!(
            task_id = task.id(),
            bytes,
            "delivered {}",
            target.display()
        );
        Ok(())
    }
}
