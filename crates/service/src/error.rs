//! Error types for launcher service operations.

use slashlaunch_patcher::PatchError;
use slashlaunch_protocol::PlatformError;
use slashlaunch_supervisor::SupervisorError;

/// Errors produced by [`LauncherService`](crate::LauncherService).
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
}
