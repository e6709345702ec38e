//! Tests for test, uninstall, info, checksum, completions, manpage and exit codes.

use super::parse;
use crate::cli::{exit_code, CliCommand};
use binst_core::error::{EXIT_DESCRIPTOR, EXIT_INTEGRITY, EXIT_NETWORK, EXIT_OTHER};
use binst_core::{InstallError, NetworkFailure, PackageDescriptor};
use clap_complete::Shell;
use std::path::Path;

#[test]
fn cli_parse_test() {
    match parse(&["binst", "test", "peek.toml"]) {
        CliCommand::Test {
            descriptor,
            install_dir,
        } => {
            assert_eq!(descriptor, Path::new("peek.toml"));
            assert!(install_dir.is_none());
        }
        _ => panic!("expected Test"),
    }
}

#[test]
fn cli_parse_uninstall_install_dir() {
    match parse(&["binst", "uninstall", "peek.toml", "--install-dir", "/tmp"]) {
        CliCommand::Uninstall {
            descriptor,
            install_dir,
        } => {
            assert_eq!(descriptor, Path::new("peek.toml"));
            assert_eq!(install_dir.as_deref(), Some(Path::new("/tmp")));
        }
        _ => panic!("expected Uninstall"),
    }
}

#[test]
fn cli_parse_info_json() {
    match parse(&["binst", "info", "peek.toml", "--json"]) {
        CliCommand::Info { descriptor, json } => {
            assert_eq!(descriptor, Path::new("peek.toml"));
            assert!(json);
        }
        _ => panic!("expected Info"),
    }
}

#[test]
fn cli_parse_checksum() {
    match parse(&["binst", "checksum", "/path/to/file.bin"]) {
        CliCommand::Checksum { path } => assert_eq!(path, Path::new("/path/to/file.bin")),
        _ => panic!("expected Checksum"),
    }
}

#[test]
fn cli_parse_completions_and_manpage() {
    match parse(&["binst", "completions", "bash"]) {
        CliCommand::Completions { shell } => assert_eq!(shell, Shell::Bash),
        _ => panic!("expected Completions"),
    }
    assert!(matches!(parse(&["binst", "manpage"]), CliCommand::Manpage));
}

#[test]
fn exit_codes_follow_error_kind() {
    let network = anyhow::Error::new(InstallError::Network {
        url: "https://example.com/peek".into(),
        kind: NetworkFailure::Resolve,
        message: "could not resolve host".into(),
    });
    assert_eq!(exit_code(&network), EXIT_NETWORK);

    let integrity = anyhow::Error::new(InstallError::Integrity {
        name: "peek".into(),
        expected: "aa".into(),
        actual: "bb".into(),
    });
    assert_eq!(exit_code(&integrity), EXIT_INTEGRITY);

    let descriptor = PackageDescriptor::from_toml_str("name = \"peek\"").unwrap_err();
    assert_eq!(exit_code(&anyhow::Error::new(descriptor)), EXIT_DESCRIPTOR);

    assert_eq!(exit_code(&anyhow::anyhow!("config unreadable")), EXIT_OTHER);
}
