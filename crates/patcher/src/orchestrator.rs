//! Layer orchestration across configured installs.
//!
//! A run walks every install through the same table of layers: disabled
//! optional layers are reset first, then each enabled layer is diffed and
//! applied in [`Layer::ALL`] order, and finally the platform hook runs.
//! The first error aborts the whole run.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use slashlaunch_protocol::{
    GameInstall, Layer, Manifest, PatchFile, Platform, RemoteSource, fetch_manifest,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::apply::apply;
use crate::cleanup::clean_up_after_failure;
use crate::error::PatchError;
use crate::plan::{PatchPlan, plan};
use crate::reset::reset;

/// Status event emitted while a patch run advances.
#[derive(Debug)]
pub enum PatchStatus {
    /// Human readable progress message.
    Message(String),
    /// The run stopped on this error. Always the last event of a run.
    Failed(PatchError),
}

/// Manifests of the layers used in one run.
#[derive(Debug, Clone, Default)]
pub struct LayerManifests {
    manifests: HashMap<Layer, Manifest>,
}

impl LayerManifests {
    /// Fetches the manifest of every layer in `layers`.
    pub async fn fetch(source: &dyn RemoteSource, layers: &[Layer]) -> Result<Self, PatchError> {
        let mut manifests = HashMap::with_capacity(layers.len());
        for &layer in layers {
            manifests.insert(layer, fetch_manifest(source, layer).await?);
        }
        Ok(Self { manifests })
    }

    pub fn insert(&mut self, layer: Layer, manifest: Manifest) {
        self.manifests.insert(layer, manifest);
    }

    /// Files of `layer`, empty if its manifest was not fetched.
    pub fn files(&self, layer: Layer) -> &[PatchFile] {
        self.manifests
            .get(&layer)
            .map(|m| m.files.as_slice())
            .unwrap_or_default()
    }
}

/// Drives layered patching and validation of game installs.
pub struct Patcher {
    source: Arc<dyn RemoteSource>,
    platform: Arc<dyn Platform>,
}

impl Patcher {
    pub fn new(source: Arc<dyn RemoteSource>, platform: Arc<dyn Platform>) -> Self {
        Self { source, platform }
    }

    /// Patches every install in order.
    ///
    /// Manifests are fetched once up front. Progress of the layer currently
    /// being downloaded goes to `progress`, status messages to `status`.
    /// The first error stops the run; installs already finished stay patched.
    pub async fn run(
        &self,
        installs: &[GameInstall],
        progress: &mpsc::Sender<f32>,
        status: &mpsc::Sender<PatchStatus>,
    ) -> Result<(), PatchError> {
        let manifests = LayerManifests::fetch(self.source.as_ref(), &Layer::ALL).await?;

        for install in installs {
            self.patch_install(install, &manifests, progress, status)
                .await?;
        }

        info!(installs = installs.len(), "patch run complete");
        Ok(())
    }

    /// Runs the full layer sequence for one install.
    pub async fn patch_install(
        &self,
        install: &GameInstall,
        manifests: &LayerManifests,
        progress: &mpsc::Sender<f32>,
        status: &mpsc::Sender<PatchStatus>,
    ) -> Result<(), PatchError> {
        let dir = install.location.as_path();

        for layer in Layer::OPTIONAL {
            if !install.layer_enabled(layer) {
                self.reset_if_installed(install, layer, manifests.files(layer))
                    .await
                    .map_err(|e| e.in_layer(layer, dir))?;
            }
        }

        for layer in Layer::ALL {
            if !install.layer_enabled(layer) {
                continue;
            }
            self.apply_layer(install, layer, manifests.files(layer), progress, status)
                .await
                .map_err(|e| e.in_layer(layer, dir))?;
        }

        self.platform
            .post_configure(dir)
            .map_err(|source| PatchError::PostConfigure {
                install: dir.to_path_buf(),
                source,
            })?;

        info!(install = %dir.display(), "install up to date");
        Ok(())
    }

    /// Removes a disabled optional layer whose marker file is on disk.
    async fn reset_if_installed(
        &self,
        install: &GameInstall,
        layer: Layer,
        files: &[PatchFile],
    ) -> Result<(), PatchError> {
        let Some(marker) = layer.marker_file() else {
            return Ok(());
        };
        let dir = install.location.clone();

        if !self.platform.is_optional_layer_installed(&dir, marker)? {
            return Ok(());
        }

        info!(install = %dir.display(), %layer, "layer disabled but installed, resetting");
        let files = files.to_vec();
        let ignore = install.ignored_files(layer);
        tokio::task::spawn_blocking(move || reset(&dir, &files, &ignore))
            .await
            .map_err(|e| PatchError::Task(e.to_string()))??;
        Ok(())
    }

    /// Diffs one layer and downloads whatever is stale.
    async fn apply_layer(
        &self,
        install: &GameInstall,
        layer: Layer,
        files: &[PatchFile],
        progress: &mpsc::Sender<f32>,
        status: &mpsc::Sender<PatchStatus>,
    ) -> Result<(), PatchError> {
        let dir = install.location.as_path();
        send_message(status, layer.checking_message()).await;

        let plan = plan_blocking(files, dir, install.ignored_files(layer)).await?;
        if plan.is_empty() {
            debug!(install = %dir.display(), %layer, "layer up to date");
            return Ok(());
        }

        send_message(
            status,
            format!("Updating {} to {}", dir.display(), layer.target()),
        )
        .await;

        if let Err(err) = apply(self.source.as_ref(), &plan, layer, dir, progress).await {
            return Err(clean_up_after_failure(dir, &plan.files, err));
        }
        Ok(())
    }

    /// Checks every install without changing anything on disk.
    ///
    /// Returns `false` as soon as one install is not at the base version,
    /// misses core files, misses files of an enabled optional layer, or
    /// still has a disabled optional layer installed.
    pub async fn validate(&self, installs: &[GameInstall]) -> Result<bool, PatchError> {
        let manifests = LayerManifests::fetch(
            self.source.as_ref(),
            &[Layer::Core, Layer::Maphack, Layer::Hd],
        )
        .await?;

        for install in installs {
            let dir = install.location.as_path();

            if !self.platform.validate_base_version(dir)? {
                info!(install = %dir.display(), "not at base version");
                return Ok(false);
            }

            for layer in [Layer::Core, Layer::Maphack, Layer::Hd] {
                if install.layer_enabled(layer) {
                    let plan =
                        plan_blocking(manifests.files(layer), dir, install.ignored_files(layer))
                            .await?;
                    if !plan.is_empty() {
                        info!(install = %dir.display(), %layer, stale = plan.len(), "layer out of date");
                        return Ok(false);
                    }
                } else if let Some(marker) = layer.marker_file() {
                    if self.platform.is_optional_layer_installed(dir, marker)? {
                        info!(install = %dir.display(), %layer, "disabled layer still installed");
                        return Ok(false);
                    }
                }
            }
        }

        Ok(true)
    }
}

/// Runs [`plan`] on the blocking pool; hashing large archives takes a while.
async fn plan_blocking(
    files: &[PatchFile],
    dir: &Path,
    ignore: Vec<String>,
) -> Result<PatchPlan, PatchError> {
    let files = files.to_vec();
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || plan(&files, &dir, &ignore))
        .await
        .map_err(|e| PatchError::Task(e.to_string()))?
}

async fn send_message(status: &mpsc::Sender<PatchStatus>, message: impl Into<String>) {
    let _ = status.send(PatchStatus::Message(message.into())).await;
}
