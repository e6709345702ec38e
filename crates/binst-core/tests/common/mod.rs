#![allow(dead_code)]

pub mod http_server;

use std::path::Path;

use binst_core::PackageDescriptor;
use sha2::{Digest, Sha256};

/// A `/bin/sh` script that prints `banner` for any arguments and exits with
/// `exit_code`. Comment lines after the `exit` grow it to at least `min_len`
/// bytes without changing its behavior.
pub fn script_artifact(banner: &str, exit_code: i32, min_len: usize) -> Vec<u8> {
    let mut body = format!("#!/bin/sh\necho \"{}\"\nexit {}\n", banner, exit_code).into_bytes();
    let line = format!("#{}\n", "x".repeat(1022));
    while body.len() < min_len {
        body.extend_from_slice(line.as_bytes());
    }
    body
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Descriptor for `url` with the given fingerprint, installing into `dir`.
pub fn descriptor(name: &str, url: &str, fingerprint: &str, dir: &Path) -> PackageDescriptor {
    let toml = format!(
        "name = \"{name}\"\nversion = \"1.0.0\"\nsource_url = \"{url}\"\nfingerprint = \"{fingerprint}\"\ninstall_path = \"{}\"\nlicense = \"\"\n",
        dir.display()
    );
    PackageDescriptor::from_toml_str(&toml).expect("valid descriptor")
}

/// Directory entries, sorted, so tests can assert nothing else was left behind.
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(rd) => rd
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}
