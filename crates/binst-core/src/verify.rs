//! Integrity check of staged bytes against the declared fingerprint.
//!
//! The only way to obtain a [`VerifiedArtifact`] is through [`verify`], and
//! the install step only accepts a `VerifiedArtifact`, so unverified bytes
//! cannot reach the install directory.

use std::path::Path;

use crate::checksum;
use crate::descriptor::{Fingerprint, PackageDescriptor};
use crate::error::InstallError;
use crate::fetch::StagedArtifact;

/// Staged bytes whose digest matched the descriptor.
#[derive(Debug)]
pub struct VerifiedArtifact {
    staged: StagedArtifact,
    digest: Fingerprint,
}

impl VerifiedArtifact {
    pub fn path(&self) -> &Path {
        self.staged.path()
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.staged.size()
    }

    pub fn digest(&self) -> &Fingerprint {
        &self.digest
    }
}

/// Hash the staged file and compare with the descriptor's fingerprint.
/// On mismatch the staged artifact is dropped (and deleted) here.
pub fn verify(
    desc: &PackageDescriptor,
    staged: StagedArtifact,
) -> Result<VerifiedArtifact, InstallError> {
    let actual = checksum::sha256_path(staged.path())
        .map(Fingerprint::from_digest)
        .map_err(|e| InstallError::fs("hash", staged.path(), e))?;

    if actual != desc.fingerprint {
        tracing::warn!(
            name = %desc.name,
            expected = %desc.fingerprint,
            actual = %actual,
            bytes = staged.size(),
            "fingerprint mismatch"
        );
        return Err(InstallError::Integrity {
            name: desc.name.clone(),
            expected: desc.fingerprint.to_hex(),
            actual: actual.to_hex(),
        });
    }

    tracing::debug!(name = %desc.name, digest = %actual, "fingerprint verified");
    Ok(VerifiedArtifact {
        staged,
        digest: actual,
    })
}
