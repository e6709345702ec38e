//! CLI for the binst artifact installer.

mod commands;

use anyhow::Result;
use binst_core::error::{EXIT_DESCRIPTOR, EXIT_OTHER};
use binst_core::{config, DescriptorError, InstallError, Installer, InstallerSettings};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use commands::{
    run_checksum, run_completions, run_info, run_install, run_manpage, run_test, run_uninstall,
};

/// Top-level CLI for binst.
#[derive(Debug, Parser)]
#[command(name = "binst", version)]
#[command(about = "binst: fetch, verify and atomically install pre-built binaries", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch, verify, install and self-check the artifact a descriptor declares.
    Install {
        /// Path to the package descriptor (TOML).
        descriptor: PathBuf,
        /// Install into this directory instead of the descriptor's or configured one.
        #[arg(long, value_name = "DIR")]
        install_dir: Option<PathBuf>,
        /// Commit without running the installed binary.
        #[arg(long)]
        no_selfcheck: bool,
        /// Print the install report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run the self-check against an already installed binary.
    Test {
        /// Path to the package descriptor (TOML).
        descriptor: PathBuf,
        #[arg(long, value_name = "DIR")]
        install_dir: Option<PathBuf>,
    },

    /// Remove the installed binary.
    Uninstall {
        /// Path to the package descriptor (TOML).
        descriptor: PathBuf,
        #[arg(long, value_name = "DIR")]
        install_dir: Option<PathBuf>,
    },

    /// Validate a descriptor and show what it would install.
    Info {
        /// Path to the package descriptor (TOML).
        descriptor: PathBuf,
        /// Print the descriptor as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compute SHA-256 of a file (e.g. to author a descriptor fingerprint).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Print shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print the man page (roff).
    Manpage,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Install {
                descriptor,
                install_dir,
                no_selfcheck,
                json,
            } => {
                let installer = installer(install_dir)?;
                run_install(&installer, &descriptor, !no_selfcheck, json)?;
            }
            CliCommand::Test {
                descriptor,
                install_dir,
            } => run_test(&installer(install_dir)?, &descriptor)?,
            CliCommand::Uninstall {
                descriptor,
                install_dir,
            } => run_uninstall(&installer(install_dir)?, &descriptor)?,
            CliCommand::Info { descriptor, json } => {
                run_info(&installer(None)?, &descriptor, json)?
            }
            CliCommand::Checksum { path } => run_checksum(&path)?,
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Manpage => run_manpage()?,
        }

        Ok(())
    }
}

/// Build the installer from on-disk config plus an optional directory override.
fn installer(install_dir: Option<PathBuf>) -> Result<Installer> {
    let cfg: InstallerSettings = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);
    let installer = Installer::new(cfg);
    Ok(match install_dir {
        Some(dir) => installer.with_install_dir(dir),
        None => installer,
    })
}

/// Process exit code for an error returned by a command.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<InstallError>() {
        return e.exit_code();
    }
    if err.downcast_ref::<DescriptorError>().is_some() {
        return EXIT_DESCRIPTOR;
    }
    EXIT_OTHER
}

#[cfg(test)]
mod tests;
