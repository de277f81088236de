//! OS-specific capability contract.
//!
//! One implementation exists per target platform (see `slashlaunch-platform`).
//! The core only calls through this trait.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::install::UnsafeName;

/// Reported by a process watcher when a launched game exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitNotice {
    pub pid: Option<u32>,
    /// Set when the process ended abnormally.
    pub error: Option<String>,
}

/// Errors from platform operations.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("launch failed: {0}")]
    Launch(String),

    #[error("system configuration failed: {0}")]
    Configure(String),

    #[error(transparent)]
    UnsafeName(#[from] UnsafeName),
}

/// OS-specific primitives used by the patcher, the supervisor and the service.
pub trait Platform: Send + Sync {
    /// Returns true if the install is already at the expected base version.
    fn validate_base_version(&self, install_dir: &Path) -> Result<bool, PlatformError>;

    /// Starts the game in `install_dir` and returns its process id.
    ///
    /// An [`ExitNotice`] is sent on `exits` once the process terminates.
    fn launch_process(
        &self,
        install_dir: &Path,
        flags: &[String],
        exits: mpsc::Sender<ExitNotice>,
    ) -> Result<u32, PlatformError>;

    /// Applies OS-specific settings after every layer is in place.
    fn post_configure(&self, install_dir: &Path) -> Result<(), PlatformError>;

    /// Applies the data execution prevention workaround for the install.
    fn set_compatibility_fix(&self, install_dir: &Path) -> Result<(), PlatformError>;

    /// Selects the realm gateway used by the game.
    fn set_network_gateway(&self, gateway: &str) -> Result<(), PlatformError>;

    /// Maps a manifest name onto the install directory.
    fn localize_path(&self, install_dir: &Path, name: &str) -> Result<PathBuf, PlatformError> {
        Ok(crate::install::localize_path(install_dir, name)?)
    }

    /// Returns true if the marker file of an optional layer is on disk.
    fn is_optional_layer_installed(
        &self,
        install_dir: &Path,
        marker: &str,
    ) -> Result<bool, PlatformError> {
        let path = self.localize_path(install_dir, marker)?;
        match std::fs::metadata(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
