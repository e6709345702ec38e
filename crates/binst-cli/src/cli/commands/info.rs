//! `binst info <descriptor>`: validate and show a descriptor.

use anyhow::Result;
use binst_core::{Installer, PackageDescriptor};
use std::path::Path;

pub fn run_info(installer: &Installer, descriptor: &Path, json: bool) -> Result<()> {
    let desc = PackageDescriptor::load(descriptor)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&desc)?);
        return Ok(());
    }

    let target = installer.target_path(&desc);
    println!("{} {}", desc.name, desc.version);
    if let Some(d) = &desc.description {
        println!("{}", d);
    }
    if let Some(h) = &desc.homepage {
        println!("homepage: {}", h);
    }
    println!("license:  {}", desc.license.as_deref().unwrap_or("(none)"));
    println!("source:   {}", desc.source_url);
    println!("sha256:   {}", desc.fingerprint);
    println!("target:   {}", target.display());
    println!("check:    {} {}", desc.binary, desc.selfcheck_args.join(" "));
    println!(
        "status:   {}",
        if target.exists() { "installed" } else { "not installed" }
    );
    Ok(())
}
