//! Removal of staging leftovers after a failed apply.

use std::io::ErrorKind;
use std::path::Path;

use slashlaunch_protocol::localize_path;
use tracing::{info, warn};

use crate::apply::{STAGING_SUFFIX, staging_path};
use crate::error::PatchError;

/// Removes staged files left in `install_dir` by an interrupted apply.
///
/// Two places are looked at: staged files at the top level of the install,
/// and the staging name of every entry in `planned`. Nested directories are
/// not scanned, so staged-looking files the patcher never wrote survive.
/// Returns the number of files removed.
pub fn clean_up_staged(install_dir: &Path, planned: &[String]) -> Result<usize, std::io::Error> {
    let mut removed = 0;

    for entry in std::fs::read_dir(install_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file()
            && entry.file_name().to_string_lossy().ends_with(STAGING_SUFFIX)
        {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }

    for name in planned {
        // Names outside the install were never staged.
        let Ok(target) = localize_path(install_dir, name) else {
            continue;
        };
        match std::fs::remove_file(staging_path(&target)) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }

    if removed > 0 {
        info!(install = %install_dir.display(), removed, "removed staged files");
    }
    Ok(removed)
}

/// Cleans up after `err` and returns the error to report.
///
/// `planned` are the names the failed apply was working on. A cleanup
/// failure does not replace `err`: both end up in a [`PatchError::Cleanup`].
pub fn clean_up_after_failure(
    install_dir: &Path,
    planned: &[String],
    err: PatchError,
) -> PatchError {
    match clean_up_staged(install_dir, planned) {
        Ok(_) => err,
        Err(source) => {
            warn!(install = %install_dir.display(), error = %source, "clean up failed");
            PatchError::Cleanup {
                original: Box::new(err),
                source,
            }
        }
    }
}
