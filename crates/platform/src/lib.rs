//! Native implementation of the slashlaunch [`Platform`] contract.
//!
//! Process launching is shared; registry-backed settings only exist on
//! Windows and are logged no-ops elsewhere.

use std::path::Path;
use std::sync::Arc;

use slashlaunch_protocol::{ExitNotice, Platform, PlatformError};
use tokio::process::Command;
use tokio::sync::mpsc;

#[cfg(target_os = "windows")]
#[path = "platform_windows.rs"]
mod native;

#[cfg(not(target_os = "windows"))]
#[path = "platform_other.rs"]
mod native;

/// Executable started for every instance.
pub const GAME_EXECUTABLE: &str = "Game.exe";

/// Gateway list header written when the registry holds none.
const GATEWAY_LIST_VERSION: &str = "1009";

/// Platform implementation for the current target OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativePlatform;

/// Returns the platform implementation for the current target OS.
pub fn native() -> Arc<dyn Platform> {
    Arc::new(NativePlatform)
}

impl Platform for NativePlatform {
    fn validate_base_version(&self, install_dir: &Path) -> Result<bool, PlatformError> {
        // Game.exe was folded into "Diablo II.exe" from 1.14 on.
        self.is_optional_layer_installed(install_dir, GAME_EXECUTABLE)
    }

    fn launch_process(
        &self,
        install_dir: &Path,
        flags: &[String],
        exits: mpsc::Sender<ExitNotice>,
    ) -> Result<u32, PlatformError> {
        let mut command = native::game_command(install_dir);
        command.args(flags).current_dir(install_dir);
        spawn_watched(command, exits)
    }

    fn post_configure(&self, install_dir: &Path) -> Result<(), PlatformError> {
        native::post_configure(install_dir)
    }

    fn set_compatibility_fix(&self, install_dir: &Path) -> Result<(), PlatformError> {
        native::set_compatibility_fix(install_dir)
    }

    fn set_network_gateway(&self, gateway: &str) -> Result<(), PlatformError> {
        native::set_network_gateway(gateway)
    }
}

/// Spawns `command` and reports its exit on `exits`.
///
/// Must be called inside a tokio runtime. A non-zero exit status, or a
/// failure waiting for the child, is reported as the notice's error.
pub fn spawn_watched(
    mut command: Command,
    exits: mpsc::Sender<ExitNotice>,
) -> Result<u32, PlatformError> {
    let mut child = command
        .kill_on_drop(false)
        .spawn()
        .map_err(|e| PlatformError::Launch(e.to_string()))?;

    let pid = child
        .id()
        .ok_or_else(|| PlatformError::Launch("process exited before reporting a pid".into()))?;

    tokio::spawn(async move {
        let error = match child.wait().await {
            Ok(status) if status.success() => None,
            Ok(status) => Some(status.to_string()),
            Err(e) => Some(e.to_string()),
        };
        tracing::debug!(pid, ?error, "game process exited");
        if exits
            .send(ExitNotice {
                pid: Some(pid),
                error,
            })
            .await
            .is_err()
        {
            tracing::warn!(pid, "exit listener gone, dropping exit notice");
        }
    });

    Ok(pid)
}

/// Adds `flags` to a compatibility layer string, keeping existing entries.
///
/// Layer strings are space separated, optionally prefixed with `~`.
pub fn merge_compat_flags(existing: &str, flags: &[&str]) -> String {
    let mut parts: Vec<&str> = existing.split_whitespace().collect();
    for flag in flags {
        if !parts.contains(flag) {
            parts.push(*flag);
        }
    }
    if parts.first() != Some(&"~") {
        parts.insert(0, "~");
    }
    parts.join(" ")
}

/// Selects `gateway` in a Battle.net gateway list.
///
/// The list is `[version, selected, (host, timezone, name)*]` where
/// `selected` is the 1-based, two digit index of the active entry. A
/// gateway matching neither a host nor a name is appended.
pub fn select_gateway(mut entries: Vec<String>, gateway: &str) -> Vec<String> {
    if entries.len() < 2 {
        entries = vec![GATEWAY_LIST_VERSION.to_string(), "01".to_string()];
    }

    let found = entries[2..].chunks(3).position(|entry| {
        entry
            .iter()
            .step_by(2)
            .any(|field| field.eq_ignore_ascii_case(gateway))
    });

    let index = match found {
        Some(index) => index,
        None => {
            // Drop a dangling partial entry before appending.
            let complete = 2 + (entries.len() - 2) / 3 * 3;
            entries.truncate(complete);
            entries.extend([gateway.to_string(), "-8".to_string(), gateway.to_string()]);
            (complete - 2) / 3
        }
    };

    entries[1] = format!("{:02}", index + 1);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn compat_flags_are_merged_once() {
        assert_eq!(merge_compat_flags("", &["DisableNXShowUI"]), "~ DisableNXShowUI");
        assert_eq!(
            merge_compat_flags("~ WINXPSP3", &["DisableNXShowUI"]),
            "~ WINXPSP3 DisableNXShowUI"
        );
        assert_eq!(
            merge_compat_flags("~ WINXPSP3 DisableNXShowUI", &["DisableNXShowUI"]),
            "~ WINXPSP3 DisableNXShowUI"
        );
        assert_eq!(merge_compat_flags("RUNASADMIN", &["WINXPSP3"]), "~ RUNASADMIN WINXPSP3");
    }

    #[test]
    fn select_existing_gateway_by_name_or_host() {
        let entries = list(&[
            "1009",
            "01",
            "uswest.battle.net",
            "8",
            "U.S. West",
            "evnt.slashdiablo.net",
            "-5",
            "Slashdiablo",
        ]);

        let by_name = select_gateway(entries.clone(), "slashdiablo");
        assert_eq!(by_name[1], "02");
        assert_eq!(by_name.len(), entries.len());

        let by_host = select_gateway(entries, "uswest.battle.net");
        assert_eq!(by_host[1], "01");
    }

    #[test]
    fn unknown_gateway_is_appended() {
        let entries = list(&["1009", "01", "uswest.battle.net", "8", "U.S. West"]);
        let updated = select_gateway(entries, "play.example.net");
        assert_eq!(
            updated,
            list(&[
                "1009",
                "02",
                "uswest.battle.net",
                "8",
                "U.S. West",
                "play.example.net",
                "-8",
                "play.example.net",
            ])
        );
    }

    #[test]
    fn empty_gateway_list_is_initialized() {
        let updated = select_gateway(Vec::new(), "evnt.slashdiablo.net");
        assert_eq!(
            updated,
            list(&[
                "1009",
                "01",
                "evnt.slashdiablo.net",
                "-8",
                "evnt.slashdiablo.net",
            ])
        );
    }

    #[test]
    fn base_version_requires_game_executable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!NativePlatform.validate_base_version(dir.path()).unwrap());

        std::fs::write(dir.path().join(GAME_EXECUTABLE), b"MZ").unwrap();
        assert!(NativePlatform.validate_base_version(dir.path()).unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_status_is_reported() {
        let (tx, mut rx) = mpsc::channel(4);

        let mut ok = Command::new("sh");
        ok.args(["-c", "exit 0"]);
        let ok_pid = spawn_watched(ok, tx.clone()).unwrap();
        let notice = rx.recv().await.unwrap();
        assert_eq!(notice, ExitNotice { pid: Some(ok_pid), error: None });

        let mut failing = Command::new("sh");
        failing.args(["-c", "exit 3"]);
        let failing_pid = spawn_watched(failing, tx).unwrap();
        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.pid, Some(failing_pid));
        assert!(notice.error.unwrap().contains('3'));
    }

    #[tokio::test]
    async fn missing_executable_fails_to_launch() {
        let (tx, _rx) = mpsc::channel(1);
        let err = spawn_watched(Command::new("/nonexistent/slashlaunch-game"), tx).unwrap_err();
        assert!(matches!(err, PlatformError::Launch(_)));
    }
}
