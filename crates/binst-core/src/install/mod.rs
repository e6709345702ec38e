//! Atomic install of a verified artifact into its destination directory.
//!
//! Under the directory lock the verified bytes are written to a hidden temp
//! file beside the destination, made executable, synced, and renamed over
//! the destination. Observers see either the previous binary or the complete
//! new one. The result is a [`PendingInstall`]: until it is committed, any
//! drop (error, unwinding) rolls the directory back to its pre-install state.

mod backup;
mod lock;
mod writer;

pub use lock::InstallLock;

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::descriptor::Fingerprint;
use crate::error::InstallError;
use crate::verify::VerifiedArtifact;
use backup::Backup;
use writer::BinaryWriter;

const DIR_ATTEMPTS: u32 = 3;

/// A binary that is in place but not yet committed. Holds the directory lock.
#[derive(Debug)]
pub struct PendingInstall {
    target: PathBuf,
    digest: Fingerprint,
    len: u64,
    backup: Option<Backup>,
    replaced: bool,
    /// Directories this install created, deepest first.
    created_dirs: Vec<PathBuf>,
    placed: bool,
    committed: bool,
    // Declared last: released after rollback in Drop.
    _lock: InstallLock,
}

/// Outcome of a committed install.
#[derive(Debug, Clone)]
pub struct InstalledBinary {
    pub path: PathBuf,
    pub digest: Fingerprint,
    pub len: u64,
    /// True when a previous file at the destination was replaced.
    pub replaced: bool,
}

/// Install `artifact` as `dir/binary`.
pub fn install(
    artifact: &VerifiedArtifact,
    dir: &Path,
    binary: &str,
    lock_wait: Option<Duration>,
) -> Result<PendingInstall, InstallError> {
    let (created_dirs, lock) = prepare_dir(dir, lock_wait)?;

    let target = dir.join(binary);
    // From here on, dropping `pending` undoes whatever has been done so far.
    let mut pending = PendingInstall {
        target,
        digest: *artifact.digest(),
        len: artifact.size(),
        backup: None,
        replaced: false,
        created_dirs,
        placed: false,
        committed: false,
        _lock: lock,
    };

    pending.backup = Backup::take(&pending.target)?;
    pending.replaced = pending.backup.is_some();

    let mut writer = BinaryWriter::create(dir, binary)?;
    let src = File::open(artifact.path()).map_err(|e| InstallError::fs("open", artifact.path(), e))?;
    let written = writer.write_from(src)?;
    if written != artifact.size() {
        return Err(InstallError::fs(
            "write",
            &pending.target,
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("short copy: {} of {} bytes", written, artifact.size()),
            ),
        ));
    }
    writer.seal()?;
    writer.finalize(&pending.target)?;
    pending.placed = true;

    tracing::info!(
        path = %pending.target.display(),
        bytes = written,
        replaced = pending.replaced,
        "binary in place"
    );
    Ok(pending)
}

impl PendingInstall {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Keep the new binary, drop the backup and release the lock.
    pub fn commit(mut self) -> InstalledBinary {
        self.committed = true;
        InstalledBinary {
            path: self.target.clone(),
            digest: self.digest,
            len: self.len,
            replaced: self.replaced,
        }
    }

    /// Undo the install explicitly. Dropping without `commit` does the same.
    pub fn rollback(self) {
        drop(self);
    }

    fn restore_previous(&mut self) {
        if self.placed {
            match self.backup.take() {
                Some(backup) => match backup.restore(&self.target) {
                    Ok(()) => {
                        tracing::info!(path = %self.target.display(), "restored previous binary")
                    }
                    Err(e) => tracing::warn!(
                        path = %self.target.display(),
                        "could not restore previous binary: {}",
                        e
                    ),
                },
                None => match fs::remove_file(&self.target) {
                    Ok(()) => tracing::info!(path = %self.target.display(), "removed new binary"),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => tracing::warn!(
                        path = %self.target.display(),
                        "could not remove new binary: {}",
                        e
                    ),
                },
            }
            writer::sync_parent(&self.target);
        }
        remove_created(&self.created_dirs);
    }
}

/// Create `dir` if needed and lock it. A concurrent installer rolling back
/// may remove a directory it created while this one waits; it is re-created.
fn prepare_dir(
    dir: &Path,
    lock_wait: Option<Duration>,
) -> Result<(Vec<PathBuf>, InstallLock), InstallError> {
    let mut attempt = 1;
    loop {
        let created_dirs = missing_dirs(dir);
        if !created_dirs.is_empty() {
            fs::create_dir_all(dir).map_err(|e| InstallError::fs("create directory", dir, e))?;
            tracing::debug!(path = %dir.display(), "created install directory");
        }
        match InstallLock::acquire(dir, lock_wait) {
            Ok(lock) => return Ok((created_dirs, lock)),
            Err(InstallError::Filesystem { source, .. })
                if source.kind() == io::ErrorKind::NotFound && attempt < DIR_ATTEMPTS =>
            {
                tracing::debug!(
                    path = %dir.display(),
                    attempt,
                    "install directory vanished, re-creating"
                );
                attempt += 1;
            }
            Err(e) => {
                remove_created(&created_dirs);
                return Err(e);
            }
        }
    }
}

/// `dir` and its missing ancestors, deepest first.
fn missing_dirs(dir: &Path) -> Vec<PathBuf> {
    dir.ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
        .map(Path::to_path_buf)
        .collect()
}

/// Remove directories created by this install; stops at the first one that
/// is no longer empty.
fn remove_created(dirs: &[PathBuf]) {
    for dir in dirs {
        if fs::remove_dir(dir).is_err() {
            break;
        }
    }
}

impl Drop for PendingInstall {
    fn drop(&mut self) {
        if !self.committed {
            self.restore_previous();
        }
    }
}
