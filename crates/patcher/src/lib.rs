//! Layered patching of local game installs against a remote distribution.
//!
//! # Pipeline
//!
//! For every configured install, in order:
//!
//! 1. **Reset** - remove optional layers that are on disk but disabled
//! 2. **Base version** - bring the game to 1.13c
//! 3. **Core** - apply the current ladder patch
//! 4. **Maphack** / **HD** - apply enabled optional layers
//! 5. **Post-configure** - OS-specific settings
//!
//! Each layer is diffed against its manifest by checksum, the stale files
//! are downloaded under a staging suffix, and only once every download
//! succeeded are they renamed into place.

pub mod apply;
pub mod checksum;
pub mod cleanup;
pub mod error;
pub mod orchestrator;
pub mod plan;
pub mod progress;
pub mod reset;

#[cfg(test)]
mod testutil;

// Re-export primary types for convenience.
pub use apply::{STAGING_SUFFIX, apply, staging_path};
pub use checksum::{ChecksumError, checksum_file};
pub use cleanup::{clean_up_after_failure, clean_up_staged};
pub use error::PatchError;
pub use orchestrator::{LayerManifests, PatchStatus, Patcher};
pub use plan::{PatchPlan, plan};
pub use progress::WriteCounter;
pub use reset::reset;
