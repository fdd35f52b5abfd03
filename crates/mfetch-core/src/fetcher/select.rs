//! Picking the produced file out of a task workspace.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::model::MediaMode;

/// Newest file in `dir` whose extension suits `mode`; if none does, the newest
/// file of any kind. Subdirectories are ignored.
pub fn select_output_file(dir: &Path, mode: MediaMode) -> io::Result<Option<PathBuf>> {
    let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((modified, entry.path()));
    }

    let matching = newest(files.iter().filter(|(_, path)| {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| mode.accepts_extension(ext))
    }));
    Ok(matching.or_else(|| newest(files.iter())))
}

fn newest<'a>(candidates: impl Iterator<Item = &'a (SystemTime, PathBuf)>) -> Option<PathBuf> {
    candidates
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn touch(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
        path
    }

    #[test]
    fn newest_matching_extension_wins() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "old.mp4", 300);
        let new = touch(dir.path(), "new.MKV", 100);
        touch(dir.path(), "newest.part", 10);
        assert_eq!(select_output_file(dir.path(), MediaMode::Video).unwrap(), Some(new));
    }

    #[test]
    fn falls_back_to_any_extension() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.webm", 200);
        let newest = touch(dir.path(), "b.opus", 50);
        assert_eq!(select_output_file(dir.path(), MediaMode::Audio).unwrap(), Some(newest));
    }

    #[test]
    fn empty_dir_and_subdirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub.mp4")).unwrap();
        assert_eq!(select_output_file(dir.path(), MediaMode::Video).unwrap(), None);
    }
}
