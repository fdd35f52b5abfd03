//! Per-task scratch directory and free-space probe.

use std::io;
use std::path::Path;

use tempfile::TempDir;

use crate::error::FetchError;

const MIB: u64 = 1024 * 1024;

/// Scratch directory owned by one task. Removed on [`close`](Self::close) or
/// when dropped, including during a panic unwind.
#[derive(Debug)]
pub struct TaskWorkspace {
    dir: TempDir,
}

impl TaskWorkspace {
    /// New directory named `<prefix>XXXX` under `root` (system temp dir if `None`).
    pub fn create(prefix: &str, root: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now, reporting failure.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}

/// Bytes available to unprivileged users on the filesystem holding `path`.
#[cfg(unix)]
#[allow(clippy::unnecessary_cast)]
pub fn available_space(path: &Path) -> io::Result<u64> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let r = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if r != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok((stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64))
}

#[cfg(not(unix))]
pub fn available_space(_path: &Path) -> io::Result<u64> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "free space probe is only implemented on unix",
    ))
}

/// Fail with [`FetchError::InsufficientDisk`] when less than `required_bytes`
/// is free at `path`. A failing probe is logged and treated as enough space.
pub fn ensure_free_space(path: &Path, required_bytes: u64) -> Result<(), FetchError> {
    match available_space(path) {
        Ok(available) if available < required_bytes => Err(FetchError::InsufficientDisk {
            available_mb: available / MIB,
            required_mb: required_bytes / MIB,
        }),
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "free space probe failed");
            Ok(())
        }
    }
}
