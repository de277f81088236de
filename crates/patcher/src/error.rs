//! Patch error types.

use std::path::PathBuf;

use slashlaunch_protocol::{FetchError, Layer, ManifestError, PlatformError, UnsafeName};

/// Errors produced while planning or applying patches.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// A manifest name resolves outside the install directory.
    #[error(transparent)]
    UnsafeName(#[from] UnsafeName),

    #[error("fetch {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: FetchError,
    },

    /// A local file exists but could not be read.
    #[error("read {}: {source}", .path.display())]
    Integrity {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or promoting a staged download failed.
    #[error("stage {}: {source}", .path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("remove {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cleaning up after a failed apply failed as well; both are kept.
    #[error("{original}; clean up failed: {source}")]
    Cleanup {
        original: Box<PatchError>,
        #[source]
        source: std::io::Error,
    },

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("{layer} layer on {}: {source}", .install.display())]
    Layer {
        layer: Layer,
        install: PathBuf,
        #[source]
        source: Box<PatchError>,
    },

    #[error("configure {}: {source}", .install.display())]
    PostConfigure {
        install: PathBuf,
        #[source]
        source: PlatformError,
    },

    #[error("task join error: {0}")]
    Task(String),
}

impl PatchError {
    /// Attaches the layer and install path a step failed on.
    pub fn in_layer(self, layer: Layer, install: impl Into<PathBuf>) -> Self {
        PatchError::Layer {
            layer,
            install: install.into(),
            source: Box::new(self),
        }
    }
}
