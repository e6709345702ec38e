//! `binst install <descriptor>`: run the full install pipeline.

use anyhow::Result;
use binst_core::{InstallReport, Installer, PackageDescriptor, RunOptions};
use std::path::Path;

pub fn run_install(
    installer: &Installer,
    descriptor: &Path,
    selfcheck: bool,
    json: bool,
) -> Result<()> {
    let desc = PackageDescriptor::load(descriptor)?;
    let report = installer.run(&desc, RunOptions { selfcheck })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    print_report(&report);
    if let Some(caveats) = desc.render_caveats(&report.path) {
        println!();
        println!("==> Caveats");
        println!("{}", caveats.trim_end());
    }
    Ok(())
}

fn print_report(r: &InstallReport) {
    let verb = if r.replaced { "Reinstalled" } else { "Installed" };
    println!("==> {} {} {}", verb, r.name, r.version);
    println!("    path:    {}", r.path.display());
    println!("    sha256:  {}", r.fingerprint);
    println!("    size:    {} bytes", r.bytes);
    match (&r.banner, r.selfcheck_ran) {
        (Some(banner), _) => println!("    check:   {}", banner),
        (None, true) => println!("    check:   ok"),
        (None, false) => println!("    check:   skipped"),
    }
}
