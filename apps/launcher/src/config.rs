//! Launcher configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/slashlaunch/launcher.toml`
//! - Windows: `%APPDATA%/slashlaunch/launcher.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use slashlaunch_protocol::GameInstall;
use slashlaunch_service::{ConfigStore, ServiceError};

/// Launcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the patch distribution server.
    #[serde(default)]
    pub patch_url: String,

    /// Last selected realm gateway.
    #[serde(default)]
    pub gateway: String,

    /// Pause between two instance launches, in milliseconds.
    #[serde(default = "default_launch_delay_ms")]
    pub launch_delay_ms: u64,

    #[serde(default)]
    pub games: Vec<GameInstall>,
}

fn default_launch_delay_ms() -> u64 {
    1500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            patch_url: String::new(),
            gateway: String::new(),
            launch_delay_ms: default_launch_delay_ms(),
            games: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or creates a default if not found.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(path)?;
            tracing::info!(path = %path.display(), "default configuration written");
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("slashlaunch")
            .join("launcher.toml")
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("slashlaunch").join("launcher.toml")
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        PathBuf::from("/tmp/slashlaunch/launcher.toml")
    }
}

/// [`ConfigStore`] backed by the TOML file.
///
/// The file is read on every call so edits made while the launcher runs
/// are picked up.
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config, ServiceError> {
        Config::load(&self.path).map_err(|e| config_error(&self.path, e))
    }
}

impl ConfigStore for FileConfigStore {
    fn games(&self) -> Result<Vec<GameInstall>, ServiceError> {
        Ok(self.load()?.games)
    }

    fn update_gateway(&self, gateway: &str) -> Result<(), ServiceError> {
        let mut config = self.load()?;
        config.gateway = gateway.to_string();
        config
            .save(&self.path)
            .map_err(|e| config_error(&self.path, e))
    }
}

fn config_error(path: &Path, err: anyhow::Error) -> ServiceError {
    ServiceError::Config(format!("{}: {err:#}", path.display()))
}
