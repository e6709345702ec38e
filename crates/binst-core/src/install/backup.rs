//! Hidden copy of the binary being replaced, kept until the install commits.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::InstallError;

const BACKUP_SUFFIX: &str = ".binst-prev";

/// Path of the backup for `target`: `.<file name>.binst-prev` in the same dir.
pub(crate) fn backup_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}{}", name, BACKUP_SUFFIX))
}

/// Removes the backup file when dropped unless it was restored.
#[derive(Debug)]
pub(crate) struct Backup {
    path: Option<PathBuf>,
}

impl Backup {
    /// Preserve the current `target`, if any. Directories and other
    /// non-file entries at `target` are a path conflict.
    pub(crate) fn take(target: &Path) -> Result<Option<Self>, InstallError> {
        let meta = match fs::symlink_metadata(target) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(InstallError::fs("stat", target, e)),
        };
        if meta.is_dir() {
            return Err(InstallError::fs(
                "replace",
                target,
                io::Error::new(io::ErrorKind::AlreadyExists, "destination is a directory"),
            ));
        }

        let path = backup_path(target);
        match fs::remove_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed stale backup"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(InstallError::fs("remove stale backup", &path, e)),
        }
        if let Err(e) = fs::hard_link(target, &path) {
            tracing::debug!("hard link for backup failed ({}), copying", e);
            fs::copy(target, &path).map_err(|e| InstallError::fs("back up", target, e))?;
        }
        Ok(Some(Backup { path: Some(path) }))
    }

    /// Put the preserved file back at `target` (atomic rename).
    pub(crate) fn restore(mut self, target: &Path) -> io::Result<()> {
        if let Some(path) = self.path.take() {
            fs::rename(&path, target)?;
        }
        Ok(())
    }
}

impl Drop for Backup {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), "could not remove backup: {}", e);
                }
            }
        }
    }
}
