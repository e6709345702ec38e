//! Exclusive advisory lock on an install directory.
//!
//! The lock is taken on the directory itself, so nothing is persisted next to
//! the installed binary. The OS drops the lock together with the descriptor,
//! which covers normal return, unwinding and process death.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs4::FileExt;

use crate::error::InstallError;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Held while a destination directory is being modified. Released on drop.
#[derive(Debug)]
pub struct InstallLock {
    dir: File,
    path: PathBuf,
}

impl InstallLock {
    /// Block until the lock on `dir` is held, or until `wait` elapses.
    ///
    /// Fails with a `NotFound` filesystem error when `dir` was removed (or
    /// replaced) by the previous holder while this call waited.
    pub fn acquire(dir: &Path, wait: Option<Duration>) -> Result<Self, InstallError> {
        let lock = match wait {
            None => {
                let file = open(dir)?;
                file.lock_exclusive()
                    .map_err(|e| InstallError::fs("lock", dir, e))?;
                Self::held(file, dir)
            }
            Some(wait) => {
                let deadline = Instant::now() + wait;
                loop {
                    if let Some(lock) = Self::try_acquire(dir)? {
                        return Ok(lock);
                    }
                    if Instant::now() >= deadline {
                        return Err(InstallError::fs(
                            "lock",
                            dir,
                            io::Error::new(
                                io::ErrorKind::WouldBlock,
                                "install directory is locked by another installer",
                            ),
                        ));
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        };
        lock.ensure_linked()?;
        Ok(lock)
    }

    /// Take the lock if it is free; `Ok(None)` when another holder has it.
    pub fn try_acquire(dir: &Path) -> Result<Option<Self>, InstallError> {
        let file = open(dir)?;
        match file.try_lock_exclusive() {
            Ok(()) => {
                let lock = Self::held(file, dir);
                lock.ensure_linked()?;
                Ok(Some(lock))
            }
            Err(e) if is_contended(&e) => Ok(None),
            Err(e) => Err(InstallError::fs("lock", dir, e)),
        }
    }

    fn held(file: File, dir: &Path) -> Self {
        tracing::debug!(path = %dir.display(), "install lock acquired");
        InstallLock {
            dir: file,
            path: dir.to_path_buf(),
        }
    }

    /// The locked descriptor must still be the directory found at `path`.
    fn ensure_linked(&self) -> Result<(), InstallError> {
        let current = match fs::metadata(&self.path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(self.vanished()),
            Err(e) => return Err(InstallError::fs("stat", &self.path, e)),
        };
        let locked = self
            .dir
            .metadata()
            .map_err(|e| InstallError::fs("stat", &self.path, e))?;
        if same_file(&locked, &current) {
            Ok(())
        } else {
            Err(self.vanished())
        }
    }

    fn vanished(&self) -> InstallError {
        InstallError::fs(
            "lock",
            &self.path,
            io::Error::new(
                io::ErrorKind::NotFound,
                "install directory was removed while waiting for the lock",
            ),
        )
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.dir) {
            tracing::warn!(path = %self.path.display(), "unlock failed: {}", e);
        }
        tracing::debug!(path = %self.path.display(), "install lock released");
    }
}

fn open(dir: &Path) -> Result<File, InstallError> {
    File::open(dir).map_err(|e| InstallError::fs("open for locking", dir, e))
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs4::lock_contended_error().raw_os_error()
}

#[cfg(unix)]
fn same_file(a: &fs::Metadata, b: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_file(_a: &fs::Metadata, b: &fs::Metadata) -> bool {
    b.is_dir()
}
