//! In-memory remote source and platform used by the unit tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use slashlaunch_protocol::{
    ExitNotice, FetchError, FetchFuture, Layer, Manifest, PatchFile, Platform, PlatformError,
    RemoteFile, RemoteSource,
};
use tokio::sync::mpsc;

/// Remote source backed by a map of path -> body.
#[derive(Default)]
pub struct MemorySource {
    files: Mutex<HashMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
    fetched: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: &str, data: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
    }

    /// Publishes `files` under `layer` along with a matching manifest.
    pub fn publish(&self, layer: Layer, files: &[(&str, &str)]) -> Manifest {
        let manifest = Manifest {
            files: files
                .iter()
                .map(|(name, data)| {
                    self.put(&layer.remote_path(name), data.as_bytes());
                    patch_file(name, data.as_bytes())
                })
                .collect(),
        };
        self.put(
            &layer.manifest_path(),
            &serde_json::to_vec(&manifest).unwrap(),
        );
        manifest
    }

    /// Makes every fetch of `path` fail with a transport error.
    pub fn fail(&self, path: &str) {
        self.failing.lock().unwrap().insert(path.to_string());
    }

    /// Paths fetched so far, manifests included.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    /// Non-manifest paths fetched so far.
    pub fn downloads(&self) -> Vec<String> {
        self.fetched()
            .into_iter()
            .filter(|p| !p.ends_with("manifest.json"))
            .collect()
    }
}

impl RemoteSource for MemorySource {
    fn fetch(&self, path: &str) -> FetchFuture<'_> {
        let path = path.to_string();
        Box::pin(async move {
            self.fetched.lock().unwrap().push(path.clone());
            if self.failing.lock().unwrap().contains(&path) {
                return Err(FetchError::Transport(format!("{path}: connection reset")));
            }
            let data = self.files.lock().unwrap().get(&path).cloned();
            match data {
                Some(d) => Ok(Box::pin(std::io::Cursor::new(d)) as RemoteFile),
                None => Err(FetchError::NotFound(path)),
            }
        })
    }
}

/// Builds the manifest entry for `data` stored as `name`.
pub fn patch_file(name: &str, data: &[u8]) -> PatchFile {
    PatchFile {
        name: name.to_string(),
        crc: crc32fast::hash(data),
        last_modified: chrono::DateTime::from_timestamp(1_570_000_000, 0).unwrap(),
        content_length: data.len() as i64,
    }
}

/// Platform with configurable answers that records post-configure calls.
#[derive(Default)]
pub struct FakePlatform {
    pub base_version_ok: Option<bool>,
    pub fail_post_configure: bool,
    pub configured: Mutex<Vec<PathBuf>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configured(&self) -> Vec<PathBuf> {
        self.configured.lock().unwrap().clone()
    }
}

impl Platform for FakePlatform {
    fn validate_base_version(&self, _install_dir: &Path) -> Result<bool, PlatformError> {
        Ok(self.base_version_ok.unwrap_or(true))
    }

    fn launch_process(
        &self,
        _install_dir: &Path,
        _flags: &[String],
        _exits: mpsc::Sender<ExitNotice>,
    ) -> Result<u32, PlatformError> {
        Err(PlatformError::Launch("not used by the patcher".into()))
    }

    fn post_configure(&self, install_dir: &Path) -> Result<(), PlatformError> {
        if self.fail_post_configure {
            return Err(PlatformError::Configure("registry unavailable".into()));
        }
        self.configured
            .lock()
            .unwrap()
            .push(install_dir.to_path_buf());
        Ok(())
    }

    fn set_compatibility_fix(&self, _install_dir: &Path) -> Result<(), PlatformError> {
        Ok(())
    }

    fn set_network_gateway(&self, _gateway: &str) -> Result<(), PlatformError> {
        Ok(())
    }
}
