//! Shared types for the slashlaunch patcher and launcher.
//!
//! Holds the manifest wire format, the patch layer table, the game install
//! record consumed from configuration, and the two external contracts the
//! core talks to: [`RemoteSource`] for fetching remote files and
//! [`Platform`] for OS-specific process and system configuration.

pub mod install;
pub mod layer;
pub mod manifest;
pub mod platform;
pub mod remote;

// Re-export primary types for convenience.
pub use install::{GameInstall, MAPHACK_CONFIG, UnsafeName, localize_path, validate_name};
pub use layer::Layer;
pub use manifest::{Manifest, ManifestError, PatchFile, fetch_manifest};
pub use platform::{ExitNotice, Platform, PlatformError};
pub use remote::{FetchError, FetchFuture, RemoteFile, RemoteSource};
