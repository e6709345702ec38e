//! SHA-256 digests of staged artifacts and installed binaries.
//!
//! Reads in fixed-size chunks so multi-megabyte artifacts are hashed with
//! bounded memory.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Compute the SHA-256 of everything readable from `reader`.
pub fn sha256_reader<R: Read>(mut reader: R) -> io::Result<[u8; 32]> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().into())
}

/// Compute the SHA-256 of a file.
pub fn sha256_path(path: &Path) -> io::Result<[u8; 32]> {
    sha256_reader(File::open(path)?)
}

/// Compute the SHA-256 of a file and return the digest as lowercase hex.
pub fn sha256_hex(path: &Path) -> io::Result<String> {
    sha256_path(path).map(hex::encode)
}
