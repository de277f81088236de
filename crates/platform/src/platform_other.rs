//! Non-Windows platforms: the game runs under wine, registry settings are
//! skipped.

use std::path::Path;

use slashlaunch_protocol::PlatformError;
use tokio::process::Command;

use crate::GAME_EXECUTABLE;

pub fn game_command(install_dir: &Path) -> Command {
    let mut command = Command::new("wine");
    command.arg(install_dir.join(GAME_EXECUTABLE));
    command
}

pub fn post_configure(install_dir: &Path) -> Result<(), PlatformError> {
    tracing::debug!(install = %install_dir.display(), "no post configuration on this platform");
    Ok(())
}

pub fn set_compatibility_fix(install_dir: &Path) -> Result<(), PlatformError> {
    tracing::info!(install = %install_dir.display(), "DEP fix is only needed on Windows, skipping");
    Ok(())
}

pub fn set_network_gateway(gateway: &str) -> Result<(), PlatformError> {
    tracing::info!(gateway, "gateway registry only exists on Windows, skipping");
    Ok(())
}
