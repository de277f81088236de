//! Diff planning: which manifest files are missing or stale on disk.

use std::path::Path;

use slashlaunch_protocol::{PatchFile, localize_path};
use tracing::debug;

use crate::checksum::{ChecksumError, checksum_file};
use crate::error::PatchError;

/// Files to download for one layer, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchPlan {
    pub files: Vec<String>,
    /// Sum of the declared sizes of `files`.
    pub total_bytes: i64,
}

impl PatchPlan {
    /// Returns true if nothing needs to be downloaded.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

/// Compares `files` against `install_dir` and returns the ones to patch.
///
/// A file is planned when it is absent or its checksum differs from the
/// manifest. Names listed in `ignore` are never planned. An unreadable local
/// file or a name that escapes `install_dir` aborts planning.
pub fn plan(
    files: &[PatchFile],
    install_dir: &Path,
    ignore: &[String],
) -> Result<PatchPlan, PatchError> {
    let mut plan = PatchPlan::default();

    for file in files {
        if ignore.iter().any(|ignored| *ignored == file.name) {
            continue;
        }

        let path = localize_path(install_dir, &file.name)?;
        match checksum_file(&path) {
            Ok(crc) if crc == file.crc => continue,
            Ok(crc) => {
                debug!(
                    file = %file.name,
                    local = format_args!("{crc:08x}"),
                    remote = format_args!("{:08x}", file.crc),
                    "checksum mismatch"
                );
            }
            Err(ChecksumError::NotFound) => {
                debug!(file = %file.name, "missing on disk");
            }
            Err(ChecksumError::Io(source)) => {
                return Err(PatchError::Integrity { path, source });
            }
        }

        plan.files.push(file.name.clone());
        plan.total_bytes += file.content_length;
    }

    Ok(plan)
}
