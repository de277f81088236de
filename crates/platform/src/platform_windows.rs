//! Windows: Game.exe runs directly, settings live in HKEY_CURRENT_USER.

use std::path::Path;

use slashlaunch_protocol::PlatformError;
use tokio::process::Command;
use winreg::RegKey;
use winreg::enums::HKEY_CURRENT_USER;

use crate::{GAME_EXECUTABLE, merge_compat_flags, select_gateway};

const COMPAT_LAYERS: &str = r"Software\Microsoft\Windows NT\CurrentVersion\AppCompatFlags\Layers";
const BATTLE_NET: &str = r"Software\Battle.net\Configuration";
const GATEWAYS_VALUE: &str = "Diablo II Battle.net gateways";

/// Compatibility mode 1.13c needs on modern Windows.
const COMPAT_MODE: &str = "WINXPSP3";
/// Opts Game.exe out of data execution prevention.
const DEP_OPT_OUT: &str = "DisableNXShowUI";

pub fn game_command(install_dir: &Path) -> Command {
    Command::new(install_dir.join(GAME_EXECUTABLE))
}

pub fn post_configure(install_dir: &Path) -> Result<(), PlatformError> {
    add_compat_flags(install_dir, &[COMPAT_MODE])
}

pub fn set_compatibility_fix(install_dir: &Path) -> Result<(), PlatformError> {
    add_compat_flags(install_dir, &[DEP_OPT_OUT])
}

pub fn set_network_gateway(gateway: &str) -> Result<(), PlatformError> {
    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let (key, _) = hkcu
        .create_subkey(BATTLE_NET)
        .map_err(|e| PlatformError::Configure(format!("open {BATTLE_NET}: {e}")))?;

    let entries: Vec<String> = key.get_value(GATEWAYS_VALUE).unwrap_or_default();
    let entries = select_gateway(entries, gateway);
    key.set_value(GATEWAYS_VALUE, &entries)
        .map_err(|e| PlatformError::Configure(format!("write {GATEWAYS_VALUE}: {e}")))?;

    tracing::info!(gateway, "gateway selected");
    Ok(())
}

fn add_compat_flags(install_dir: &Path, flags: &[&str]) -> Result<(), PlatformError> {
    let exe = install_dir.join(GAME_EXECUTABLE);
    let name = exe.to_string_lossy();

    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let (key, _) = hkcu
        .create_subkey(COMPAT_LAYERS)
        .map_err(|e| PlatformError::Configure(format!("open {COMPAT_LAYERS}: {e}")))?;

    let existing: String = key.get_value(&*name).unwrap_or_default();
    let merged = merge_compat_flags(&existing, flags);
    if merged != existing {
        key.set_value(&*name, &merged)
            .map_err(|e| PlatformError::Configure(format!("write layer for {name}: {e}")))?;
        tracing::info!(exe = %exe.display(), layers = %merged, "compatibility flags updated");
    }
    Ok(())
}
