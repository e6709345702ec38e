//! The install pipeline: fetch → verify → install → selfcheck → commit.
//!
//! Sequential and synchronous. Each stage is fatal and never retried here;
//! retry policy belongs to whoever orchestrates several installs. On any
//! failure the destination is left exactly as it was before the run.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;

use crate::config::InstallerSettings;
use crate::descriptor::{Fingerprint, PackageDescriptor};
use crate::error::InstallError;
use crate::fetch::{self, FetchOptions, StagedArtifact};
use crate::install::{self, InstallLock, PendingInstall};
use crate::selfcheck::{self, SelfCheckReport};
use crate::verify::{self, VerifiedArtifact};

/// Per-run switches.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Run the self-check before committing (default true).
    pub selfcheck: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions { selfcheck: true }
    }
}

/// Summary of a successful install.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
    pub fingerprint: Fingerprint,
    pub bytes: u64,
    pub replaced: bool,
    /// Version banner printed by the self-check, when it ran.
    pub banner: Option<String>,
    pub selfcheck_ran: bool,
    pub elapsed_ms: u64,
}

/// Result of an uninstall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    NotInstalled,
}

/// Artifact installer bound to explicit settings.
#[derive(Debug, Clone)]
pub struct Installer {
    settings: InstallerSettings,
    install_dir_override: Option<PathBuf>,
}

impl Installer {
    pub fn new(settings: InstallerSettings) -> Self {
        Installer {
            settings,
            install_dir_override: None,
        }
    }

    /// Install into `dir` regardless of descriptor or settings.
    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir_override = Some(dir.into());
        self
    }

    /// Destination directory: override, then descriptor, then settings.
    pub fn install_dir(&self, desc: &PackageDescriptor) -> PathBuf {
        self.install_dir_override
            .clone()
            .or_else(|| desc.install_path.clone())
            .unwrap_or_else(|| self.settings.install_dir.clone())
    }

    /// Full path of the installed binary.
    pub fn target_path(&self, desc: &PackageDescriptor) -> PathBuf {
        self.install_dir(desc).join(&desc.binary)
    }

    pub fn fetch(&self, desc: &PackageDescriptor) -> Result<StagedArtifact, InstallError> {
        tracing::info!(name = %desc.name, url = %desc.source_url, "fetching");
        fetch::fetch(desc, &FetchOptions::from(&self.settings))
    }

    pub fn verify(
        &self,
        desc: &PackageDescriptor,
        staged: StagedArtifact,
    ) -> Result<VerifiedArtifact, InstallError> {
        verify::verify(desc, staged)
    }

    pub fn install(
        &self,
        desc: &PackageDescriptor,
        artifact: &VerifiedArtifact,
    ) -> Result<PendingInstall, InstallError> {
        install::install(
            artifact,
            &self.install_dir(desc),
            &desc.binary,
            self.settings.lock_wait(),
        )
    }

    pub fn selfcheck(&self, desc: &PackageDescriptor) -> Result<SelfCheckReport, InstallError> {
        selfcheck::selfcheck(
            &self.target_path(desc),
            &desc.selfcheck_args,
            self.settings.selfcheck_timeout(),
        )
    }

    /// Fetch, verify, install and self-check `desc`, then commit.
    pub fn run(
        &self,
        desc: &PackageDescriptor,
        opts: RunOptions,
    ) -> Result<InstallReport, InstallError> {
        let started = Instant::now();
        let result = self.run_stages(desc, opts, started);
        if let Err(e) = &result {
            tracing::error!(name = %desc.name, stage = e.stage(), "install aborted: {}", e);
        }
        result
    }

    fn run_stages(
        &self,
        desc: &PackageDescriptor,
        opts: RunOptions,
        started: Instant,
    ) -> Result<InstallReport, InstallError> {
        let staged = self.fetch(desc)?;
        let verified = self.verify(desc, staged)?;
        let pending = self.install(desc, &verified)?;
        // Staging is no longer needed once the bytes are in place.
        drop(verified);

        let report = if opts.selfcheck {
            // On error `pending` is dropped here and rolls back.
            Some(self.selfcheck(desc)?)
        } else {
            None
        };
        let installed = pending.commit();

        tracing::info!(
            name = %desc.name,
            version = %desc.version,
            path = %installed.path.display(),
            "installed"
        );
        Ok(InstallReport {
            name: desc.name.clone(),
            version: desc.version.clone(),
            path: installed.path,
            fingerprint: installed.digest,
            bytes: installed.len,
            replaced: installed.replaced,
            selfcheck_ran: report.is_some(),
            banner: report.and_then(|r| r.banner),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Self-check an already installed binary (no fetch).
    pub fn test(&self, desc: &PackageDescriptor) -> Result<SelfCheckReport, InstallError> {
        let target = self.target_path(desc);
        if let Err(e) = fs::metadata(&target) {
            return Err(InstallError::fs("stat installed binary", &target, e));
        }
        self.selfcheck(desc)
    }

    /// Remove the installed binary under the directory lock.
    pub fn uninstall(&self, desc: &PackageDescriptor) -> Result<Removal, InstallError> {
        let dir = self.install_dir(desc);
        if !dir.exists() {
            return Ok(Removal::NotInstalled);
        }
        let _lock = InstallLock::acquire(&dir, self.settings.lock_wait())?;
        let target = dir.join(&desc.binary);
        match fs::symlink_metadata(&target) {
            Ok(m) if m.is_dir() => {
                return Err(InstallError::fs(
                    "remove",
                    &target,
                    io::Error::other("destination is a directory"),
                ));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Removal::NotInstalled),
            Err(e) => return Err(InstallError::fs("stat", &target, e)),
        }
        fs::remove_file(&target).map_err(|e| InstallError::fs("remove", &target, e))?;
        tracing::info!(name = %desc.name, path = %target.display(), "uninstalled");
        Ok(Removal::Removed)
    }
}
