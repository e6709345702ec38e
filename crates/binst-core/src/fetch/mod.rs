//! Artifact fetch: a single GET of `source_url` into a private staging
//! directory.
//!
//! The staging directory lives outside the install directory and is removed
//! when the [`StagedArtifact`] is dropped, so a failed or abandoned install
//! never leaves download debris behind.

mod classify;

pub use classify::{classify_curl_error, classify_http_status};

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::InstallerSettings;
use crate::descriptor::PackageDescriptor;
use crate::error::InstallError;

/// Transport limits for one fetch. Every limit is finite so a stalled
/// server fails closed as a network error.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    pub max_redirects: u32,
}

impl From<&InstallerSettings> for FetchOptions {
    fn from(s: &InstallerSettings) -> Self {
        FetchOptions {
            connect_timeout: s.connect_timeout(),
            timeout: s.transfer_timeout(),
            low_speed_limit: s.low_speed_limit_bytes,
            low_speed_time: s.low_speed_time(),
            max_redirects: s.max_redirects,
        }
    }
}

/// Downloaded but not yet verified bytes.
#[derive(Debug)]
pub struct StagedArtifact {
    // Dropping the TempDir removes the staged file.
    _dir: tempfile::TempDir,
    path: PathBuf,
    len: u64,
}

impl StagedArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of bytes received.
    pub fn size(&self) -> u64 {
        self.len
    }
}

fn network_error(url: &str, e: &curl::Error) -> InstallError {
    InstallError::Network {
        url: url.to_string(),
        kind: classify_curl_error(e),
        message: e.to_string(),
    }
}

/// Fetch the descriptor's artifact into a fresh staging directory.
pub fn fetch(desc: &PackageDescriptor, opts: &FetchOptions) -> Result<StagedArtifact, InstallError> {
    let dir = tempfile::Builder::new()
        .prefix("binst-stage-")
        .tempdir()
        .map_err(|e| InstallError::fs("create staging dir", &std::env::temp_dir(), e))?;
    let path = dir.path().join(&desc.binary);
    let len = fetch_to_path(desc.source_url.as_str(), &path, opts)?;
    Ok(StagedArtifact {
        _dir: dir,
        path,
        len,
    })
}

/// GET `url` and write the body to `dest`, returning the byte count.
pub fn fetch_to_path(url: &str, dest: &Path, opts: &FetchOptions) -> Result<u64, InstallError> {
    let started = Instant::now();
    let mut file = File::create(dest).map_err(|e| InstallError::fs("create", dest, e))?;

    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, opts).map_err(|e| network_error(url, &e))?;

    let mut written = 0u64;
    let mut write_err: Option<io::Error> = None;
    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| match file.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_err = Some(e);
                    Ok(0) // abort transfer
                }
            })
            .map_err(|e| network_error(url, &e))?;
        transfer.perform()
    };

    if let Some(e) = write_err {
        return Err(InstallError::fs("write", dest, e));
    }
    if let Err(e) = performed {
        tracing::debug!(url, error = %e, "fetch failed after {} bytes", written);
        return Err(network_error(url, &e));
    }

    let code = easy.response_code().map_err(|e| network_error(url, &e))?;
    if let Some(kind) = classify_http_status(code) {
        return Err(InstallError::Network {
            url: url.to_string(),
            kind,
            message: format!("GET returned HTTP {}", code),
        });
    }

    file.sync_all().map_err(|e| InstallError::fs("sync", dest, e))?;
    tracing::debug!(
        url,
        bytes = written,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "fetched artifact"
    );
    Ok(written)
}

fn configure(easy: &mut curl::easy::Easy, url: &str, opts: &FetchOptions) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(opts.max_redirects)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.timeout)?;
    easy.low_speed_limit(opts.low_speed_limit)?;
    easy.low_speed_time(opts.low_speed_time)?;
    easy.useragent(concat!("binst/", env!("CARGO_PKG_VERSION")))?;
    Ok(())
}
