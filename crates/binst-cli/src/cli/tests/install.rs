//! Tests for the install subcommand.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_install() {
    match parse(&["binst", "install", "peek.toml"]) {
        CliCommand::Install {
            descriptor,
            install_dir,
            no_selfcheck,
            json,
        } => {
            assert_eq!(descriptor, Path::new("peek.toml"));
            assert!(install_dir.is_none());
            assert!(!no_selfcheck);
            assert!(!json);
        }
        _ => panic!("expected Install"),
    }
}

#[test]
fn cli_parse_install_install_dir() {
    match parse(&["binst", "install", "peek.toml", "--install-dir", "/opt/bin"]) {
        CliCommand::Install { install_dir, .. } => {
            assert_eq!(install_dir.as_deref(), Some(Path::new("/opt/bin")));
        }
        _ => panic!("expected Install with --install-dir"),
    }
}

#[test]
fn cli_parse_install_flags() {
    match parse(&["binst", "install", "peek.toml", "--no-selfcheck", "--json"]) {
        CliCommand::Install {
            no_selfcheck, json, ..
        } => {
            assert!(no_selfcheck);
            assert!(json);
        }
        _ => panic!("expected Install with flags"),
    }
}

#[test]
fn cli_install_requires_descriptor() {
    assert!(Cli::try_parse_from(["binst", "install"]).is_err());
}
