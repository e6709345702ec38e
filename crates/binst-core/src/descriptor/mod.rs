//! Package descriptor: the declarative record describing one installable
//! artifact.
//!
//! Descriptors are TOML files authored alongside a release. They are parsed
//! and validated once, up front, and never mutated afterwards; every
//! precondition (fingerprint length included) is checked here so that the
//! pipeline never touches the network for a malformed descriptor.

pub mod caveats;
mod fingerprint;

pub use fingerprint::{Fingerprint, FingerprintError};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Self-check arguments used when a descriptor does not declare any.
pub const DEFAULT_SELFCHECK_ARGS: &[&str] = &["--version"];

const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "file"];

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("read descriptor {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse descriptor: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("descriptor field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> DescriptorError {
    DescriptorError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// On-disk shape; validated into [`PackageDescriptor`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescriptor {
    name: String,
    version: String,
    source_url: String,
    fingerprint: String,
    #[serde(default)]
    install_path: Option<PathBuf>,
    #[serde(default)]
    license: Option<String>,
    #[serde(default)]
    binary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    selfcheck_args: Option<Vec<String>>,
    #[serde(default)]
    caveats: Option<String>,
}

/// A validated package descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: String,
    pub source_url: Url,
    pub fingerprint: Fingerprint,
    /// Destination directory; `None` defers to the configured install dir.
    pub install_path: Option<PathBuf>,
    /// Advisory license. Absent and empty are both `None`.
    pub license: Option<String>,
    /// File name written into the destination directory.
    pub binary: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub selfcheck_args: Vec<String>,
    pub caveats: Option<String>,
}

impl PackageDescriptor {
    /// Read and validate a descriptor file.
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let data = fs::read_to_string(path).map_err(|source| DescriptorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let desc = Self::from_toml_str(&data)?;
        tracing::debug!(
            name = %desc.name,
            version = %desc.version,
            "loaded descriptor from {}",
            path.display()
        );
        Ok(desc)
    }

    /// Parse and validate descriptor TOML.
    pub fn from_toml_str(s: &str) -> Result<Self, DescriptorError> {
        let raw: RawDescriptor = toml::from_str(s)?;
        Self::validate(raw)
    }

    fn validate(raw: RawDescriptor) -> Result<Self, DescriptorError> {
        let name = raw.name.trim().to_string();
        check_file_name("name", &name)?;

        let version = raw.version.trim().to_string();
        if version.is_empty() {
            return Err(invalid("version", "must not be empty"));
        }

        let source_url = Url::parse(raw.source_url.trim())
            .map_err(|e| invalid("source_url", e.to_string()))?;
        if !SUPPORTED_SCHEMES.contains(&source_url.scheme()) {
            return Err(invalid(
                "source_url",
                format!("unsupported scheme `{}`", source_url.scheme()),
            ));
        }

        let fingerprint: Fingerprint = raw
            .fingerprint
            .parse()
            .map_err(|e: FingerprintError| invalid("fingerprint", e.to_string()))?;

        let binary = match raw.binary {
            Some(b) => {
                let b = b.trim().to_string();
                check_file_name("binary", &b)?;
                b
            }
            None => name.clone(),
        };

        if let Some(p) = &raw.install_path {
            if p.as_os_str().is_empty() {
                return Err(invalid("install_path", "must not be empty"));
            }
        }

        let selfcheck_args = raw.selfcheck_args.unwrap_or_else(|| {
            DEFAULT_SELFCHECK_ARGS
                .iter()
                .map(|s| s.to_string())
                .collect()
        });

        Ok(PackageDescriptor {
            name,
            version,
            source_url,
            fingerprint,
            install_path: raw.install_path,
            license: non_empty(raw.license),
            binary,
            description: non_empty(raw.description),
            homepage: non_empty(raw.homepage),
            selfcheck_args,
            caveats: non_empty(raw.caveats),
        })
    }

    /// Render the caveats template for a binary installed at `installed_at`.
    pub fn render_caveats(&self, installed_at: &Path) -> Option<String> {
        self.caveats
            .as_deref()
            .map(|t| caveats::render(t, self, installed_at))
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// A name that becomes a single path component inside the install dir.
fn check_file_name(field: &'static str, value: &str) -> Result<(), DescriptorError> {
    if value.is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    if value.starts_with('.') {
        return Err(invalid(field, "must not start with '.'"));
    }
    if value.contains(['/', '\\', '\0']) {
        return Err(invalid(field, "must not contain path separators"));
    }
    Ok(())
}
