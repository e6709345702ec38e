//! Same-directory temp file that is renamed over the destination.
//!
//! The temp file is created next to the final path so the rename stays on one
//! filesystem and is atomic; until then it is hidden (`.<binary>.XXXX.part`)
//! and deleted on drop.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::error::InstallError;

/// Temporary file suffix used before atomic rename.
pub(crate) const TEMP_SUFFIX: &str = ".part";

/// Mode of an installed binary.
#[cfg(unix)]
const EXECUTABLE_MODE: u32 = 0o755;

pub(crate) struct BinaryWriter {
    temp: tempfile::NamedTempFile,
}

impl BinaryWriter {
    /// Create a hidden temp file for `binary` inside `dir`.
    pub(crate) fn create(dir: &Path, binary: &str) -> Result<Self, InstallError> {
        let temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", binary))
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)
            .map_err(|e| InstallError::fs("create temp file in", dir, e))?;
        Ok(BinaryWriter { temp })
    }

    /// Copy all of `src` into the temp file. Returns bytes written.
    pub(crate) fn write_from<R: Read>(&mut self, mut src: R) -> Result<u64, InstallError> {
        io::copy(&mut src, self.temp.as_file_mut())
            .map_err(|e| InstallError::fs("write", self.temp.path(), e))
    }

    /// Mark the temp file executable and flush it to disk.
    pub(crate) fn seal(&mut self) -> Result<(), InstallError> {
        set_executable(self.temp.as_file())
            .map_err(|e| InstallError::fs("chmod", self.temp.path(), e))?;
        self.temp
            .as_file()
            .sync_all()
            .map_err(|e| InstallError::fs("sync", self.temp.path(), e))
    }

    /// Atomically rename the temp file to `final_path`, closing it first so
    /// the binary can be executed right away.
    pub(crate) fn finalize(self, final_path: &Path) -> Result<(), InstallError> {
        let temp_path = self.temp.into_temp_path();
        temp_path
            .persist(final_path)
            .map_err(|e| InstallError::fs("rename into place", final_path, e.error))?;
        sync_parent(final_path);
        Ok(())
    }
}

#[cfg(unix)]
fn set_executable(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(EXECUTABLE_MODE))
}

#[cfg(not(unix))]
fn set_executable(_file: &File) -> io::Result<()> {
    Ok(())
}

/// Persist the rename itself. Failure only costs durability, so it is logged.
#[cfg(unix)]
pub(crate) fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = File::open(parent).and_then(|d| d.sync_all()) {
            tracing::warn!(path = %parent.display(), "directory sync failed: {}", e);
        }
    }
}

#[cfg(not(unix))]
pub(crate) fn sync_parent(_path: &Path) {}
