//! Removal of an optional layer the user disabled.

use std::path::Path;

use slashlaunch_protocol::{PatchFile, localize_path};
use tracing::{debug, info};

use crate::error::PatchError;
use crate::plan::plan;

/// Deletes the files of a layer from `install_dir`, except `ignore`.
///
/// The layer counts as installed when fewer than all of its manifest files
/// are stale. If every file is stale the layer is treated as absent and
/// nothing is deleted. Files already missing are skipped. Returns the number
/// of files removed.
///
/// Every name is checked before the first removal, so a manifest with a name
/// outside `install_dir` deletes nothing.
pub fn reset(
    install_dir: &Path,
    files: &[PatchFile],
    ignore: &[String],
) -> Result<usize, PatchError> {
    let stale = plan(files, install_dir, ignore)?;
    if stale.len() >= files.len() {
        debug!(install = %install_dir.display(), "layer not installed, nothing to reset");
        return Ok(0);
    }

    let mut removed = 0;
    for file in files {
        if ignore.iter().any(|ignored| *ignored == file.name) {
            continue;
        }

        let path = localize_path(install_dir, &file.name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(source) => return Err(PatchError::Remove { path, source }),
        }
    }

    info!(install = %install_dir.display(), removed, "layer reset");
    Ok(removed)
}
