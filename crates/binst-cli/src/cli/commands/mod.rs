//! CLI command handlers. Each command is in its own file.

mod checksum;
mod completions;
mod info;
mod install;
mod test;
mod uninstall;

pub use checksum::run_checksum;
pub use completions::{run_completions, run_manpage};
pub use info::run_info;
pub use install::run_install;
pub use test::run_test;
pub use uninstall::run_uninstall;
