//! binst core: fetch a pre-built binary, verify its SHA-256 fingerprint and
//! install it atomically, then prove it runs.

pub mod checksum;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod fetch;
pub mod install;
pub mod logging;
pub mod pipeline;
pub mod selfcheck;
pub mod verify;

pub use config::InstallerSettings;
pub use descriptor::{DescriptorError, Fingerprint, PackageDescriptor};
pub use error::{InstallError, NetworkFailure, SelfCheckFailure};
pub use pipeline::{InstallReport, Installer, Removal, RunOptions};
