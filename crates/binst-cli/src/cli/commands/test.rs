//! `binst test <descriptor>`: self-check the installed binary.

use anyhow::Result;
use binst_core::{Installer, PackageDescriptor};
use std::path::Path;

pub fn run_test(installer: &Installer, descriptor: &Path) -> Result<()> {
    let desc = PackageDescriptor::load(descriptor)?;
    let report = installer.test(&desc)?;
    println!(
        "{} {}: ok ({} ms){}",
        desc.name,
        desc.version,
        report.elapsed.as_millis(),
        report
            .banner
            .map(|b| format!(": {}", b))
            .unwrap_or_default()
    );
    Ok(())
}
