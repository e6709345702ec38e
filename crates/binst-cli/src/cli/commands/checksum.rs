//! `binst checksum <file>`: print SHA-256 in `sha256sum` format.

use anyhow::{Context, Result};
use binst_core::checksum;
use std::path::Path;

pub fn run_checksum(path: &Path) -> Result<()> {
    let digest = checksum::sha256_hex(path).with_context(|| format!("hash {}", path.display()))?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
