//! Remote fetch capability.
//!
//! The core never talks to the network directly. It asks a [`RemoteSource`]
//! for a named file and receives its body as an async byte stream. The
//! HTTP implementation lives in `slashlaunch-remote`; tests use in-memory
//! sources.

use std::future::Future;
use std::pin::Pin;

use tokio::io::AsyncRead;

/// Body of a fetched remote file.
pub type RemoteFile = Pin<Box<dyn AsyncRead + Send>>;

/// Future returned by [`RemoteSource::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<RemoteFile, FetchError>> + Send + 'a>>;

/// Errors from the remote fetch capability.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("remote file not found: {0}")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Abstract access to the remote file distribution.
pub trait RemoteSource: Send + Sync {
    /// Fetches the file at `path`, relative to the distribution root
    /// (for example `current/manifest.json`).
    fn fetch(&self, path: &str) -> FetchFuture<'_>;
}
