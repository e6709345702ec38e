//! `binst uninstall <descriptor>`: remove the installed binary.

use anyhow::Result;
use binst_core::{Installer, PackageDescriptor, Removal};
use std::path::Path;

pub fn run_uninstall(installer: &Installer, descriptor: &Path) -> Result<()> {
    let desc = PackageDescriptor::load(descriptor)?;
    let target = installer.target_path(&desc);
    match installer.uninstall(&desc)? {
        Removal::Removed => println!("Removed {}", target.display()),
        Removal::NotInstalled => {
            println!("{} is not installed at {}", desc.name, target.display())
        }
    }
    Ok(())
}
