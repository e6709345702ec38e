use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Installer configuration loaded from `~/.config/binst/config.toml`.
///
/// Holds everything that would otherwise be process-wide packaging state
/// (shared install directory, transport limits); the installer only ever
/// sees it as an explicit value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerSettings {
    /// Directory used when a descriptor has no `install_path`.
    pub install_dir: PathBuf,
    /// Seconds allowed for establishing the connection.
    pub connect_timeout_secs: u64,
    /// Seconds allowed for the whole transfer.
    pub transfer_timeout_secs: u64,
    /// Abort when throughput stays below this many bytes/s ...
    pub low_speed_limit_bytes: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
    /// Maximum HTTP redirects followed.
    pub max_redirects: u32,
    /// Seconds the self-check process may run before it is killed.
    pub selfcheck_timeout_secs: u64,
    /// Seconds to wait for the install-directory lock (None = wait indefinitely).
    pub lock_wait_secs: Option<u64>,
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            install_dir: default_install_dir(),
            connect_timeout_secs: 30,
            transfer_timeout_secs: 600,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
            max_redirects: 10,
            selfcheck_timeout_secs: 30,
            lock_wait_secs: None,
        }
    }
}

impl InstallerSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }

    pub fn low_speed_time(&self) -> Duration {
        Duration::from_secs(self.low_speed_time_secs)
    }

    pub fn selfcheck_timeout(&self) -> Duration {
        Duration::from_secs(self.selfcheck_timeout_secs)
    }

    pub fn lock_wait(&self) -> Option<Duration> {
        self.lock_wait_secs.map(Duration::from_secs)
    }
}

/// `$HOME/.local/bin`, the per-user executable directory.
fn default_install_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(".local").join("bin"),
        _ => PathBuf::from("/usr/local/bin"),
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("binst")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<InstallerSettings> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = InstallerSettings::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg: InstallerSettings =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = InstallerSettings::default();
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.transfer_timeout(), Duration::from_secs(600));
        assert_eq!(cfg.selfcheck_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.max_redirects, 10);
        assert!(cfg.lock_wait().is_none());
        assert!(cfg.install_dir.is_absolute());
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut cfg = InstallerSettings::default();
        cfg.lock_wait_secs = Some(5);
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: InstallerSettings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_partial_values_fill_defaults() {
        let toml = r#"
            install_dir = "/opt/tools/bin"
            transfer_timeout_secs = 120
            lock_wait_secs = 10
        "#;
        let cfg: InstallerSettings = toml::from_str(toml).unwrap();
        assert_eq!(cfg.install_dir, PathBuf::from("/opt/tools/bin"));
        assert_eq!(cfg.transfer_timeout(), Duration::from_secs(120));
        assert_eq!(cfg.lock_wait(), Some(Duration::from_secs(10)));
        assert_eq!(cfg.connect_timeout_secs, 30);
        assert_eq!(cfg.low_speed_limit_bytes, 1024);
    }

    #[test]
    fn config_toml_rejects_wrong_types() {
        let toml = r#"connect_timeout_secs = "soon""#;
        assert!(toml::from_str::<InstallerSettings>(toml).is_err());
    }
}
