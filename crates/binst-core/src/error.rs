//! Error taxonomy for the install pipeline.
//!
//! Every stage fails with exactly one [`InstallError`] kind so callers (and the
//! CLI exit code) can tell a bad descriptor from a network, integrity,
//! filesystem or self-check failure.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use crate::descriptor::DescriptorError;

/// Exit code for success.
pub const EXIT_OK: i32 = 0;
/// Exit code for failures outside the taxonomy below.
pub const EXIT_OTHER: i32 = 1;
/// Exit code for an unreadable or invalid descriptor.
pub const EXIT_DESCRIPTOR: i32 = 2;
pub const EXIT_NETWORK: i32 = 3;
pub const EXIT_INTEGRITY: i32 = 4;
pub const EXIT_FILESYSTEM: i32 = 5;
pub const EXIT_SELFCHECK: i32 = 6;

/// Classification of a failed fetch. Retries are the caller's business;
/// [`NetworkFailure::is_transient`] is the hint for that decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailure {
    /// Host (or proxy) name could not be resolved.
    Resolve,
    /// TCP/TLS connection could not be established.
    Connect,
    /// Connect, low-speed or overall transfer timeout expired.
    Timeout,
    /// Server answered with a non-2xx HTTP status.
    Status(u32),
    /// Connection broke mid-transfer or the body was shorter than announced.
    Transfer,
    /// Anything else reported by the transport.
    Other,
}

impl NetworkFailure {
    /// True when a later attempt might succeed without changing the descriptor.
    pub fn is_transient(&self) -> bool {
        match self {
            NetworkFailure::Resolve
            | NetworkFailure::Connect
            | NetworkFailure::Timeout
            | NetworkFailure::Transfer => true,
            NetworkFailure::Status(code) => *code == 429 || (500..=599).contains(code),
            NetworkFailure::Other => false,
        }
    }
}

impl fmt::Display for NetworkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkFailure::Resolve => write!(f, "name resolution failed"),
            NetworkFailure::Connect => write!(f, "connection failed"),
            NetworkFailure::Timeout => write!(f, "timed out"),
            NetworkFailure::Status(code) => write!(f, "HTTP {}", code),
            NetworkFailure::Transfer => write!(f, "transfer interrupted"),
            NetworkFailure::Other => write!(f, "transport error"),
        }
    }
}

/// Why a self-check did not pass.
#[derive(Debug, thiserror::Error)]
pub enum SelfCheckFailure {
    /// The binary could not be executed at all (missing, not executable,
    /// wrong architecture).
    #[error("could not execute: {0}")]
    Spawn(#[source] io::Error),
    /// The process ran but did not exit with status 0.
    #[error("{status}{}", stderr_suffix(.stderr))]
    Exited { status: ExitStatus, stderr: String },
    /// The process did not exit in time and was killed.
    #[error("no exit after {0:?}")]
    TimedOut(Duration),
}

fn stderr_suffix(stderr: &str) -> String {
    match stderr.lines().map(str::trim).find(|l| !l.is_empty()) {
        Some(line) => format!(" ({})", line),
        None => String::new(),
    }
}

/// A fatal pipeline error. Nothing is retried at this layer.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("fetch {url} failed: {kind}: {message}")]
    Network {
        url: String,
        kind: NetworkFailure,
        message: String,
    },

    #[error("integrity check failed for {name}: expected sha256 {expected}, got {actual}")]
    Integrity {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("{action} {}: {source}", .path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("self-check of {} failed: {reason}", .path.display())]
    SelfCheck {
        path: PathBuf,
        #[source]
        reason: SelfCheckFailure,
    },
}

impl InstallError {
    pub(crate) fn fs(action: &'static str, path: &Path, source: io::Error) -> Self {
        InstallError::Filesystem {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Process exit code for this failure kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallError::Descriptor(_) => EXIT_DESCRIPTOR,
            InstallError::Network { .. } => EXIT_NETWORK,
            InstallError::Integrity { .. } => EXIT_INTEGRITY,
            InstallError::Filesystem { .. } => EXIT_FILESYSTEM,
            InstallError::SelfCheck { .. } => EXIT_SELFCHECK,
        }
    }

    /// Short stage name for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            InstallError::Descriptor(_) => "descriptor",
            InstallError::Network { .. } => "fetch",
            InstallError::Integrity { .. } => "verify",
            InstallError::Filesystem { .. } => "filesystem",
            InstallError::SelfCheck { .. } => "selfcheck",
        }
    }
}
