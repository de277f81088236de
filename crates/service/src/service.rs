//! Launcher service operations.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use slashlaunch_patcher::{PatchStatus, Patcher};
use slashlaunch_protocol::{Platform, RemoteSource};
use slashlaunch_supervisor::{RunningInstance, Supervisor};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

use crate::config::ConfigStore;
use crate::error::ServiceError;

/// Progress values a patch run may queue before it waits for the reader.
const PROGRESS_CAPACITY: usize = 1;
/// Status events a patch run may queue before it waits for the reader.
const STATUS_CAPACITY: usize = 1;

/// Receiving ends of a running patch.
///
/// Both streams must be drained: the run blocks while either one is full.
/// They close when the run ends. `done` resolves to `true` only after a
/// fully successful run; on failure the last status event is
/// [`PatchStatus::Failed`] and `done` resolves to `false`.
pub struct PatchRun {
    pub progress: mpsc::Receiver<f32>,
    pub status: mpsc::Receiver<PatchStatus>,
    pub done: oneshot::Receiver<bool>,
}

/// Front-end facing launcher operations.
pub struct LauncherService {
    config: Arc<dyn ConfigStore>,
    platform: Arc<dyn Platform>,
    patcher: Arc<Patcher>,
    supervisor: Supervisor,
}

impl LauncherService {
    /// Creates the service. Must be called inside a tokio runtime.
    pub fn new(
        config: Arc<dyn ConfigStore>,
        source: Arc<dyn RemoteSource>,
        platform: Arc<dyn Platform>,
    ) -> Self {
        Self {
            config,
            patcher: Arc::new(Patcher::new(source, Arc::clone(&platform))),
            supervisor: Supervisor::new(Arc::clone(&platform)),
            platform,
        }
    }

    /// Overrides the pause between instance launches.
    pub fn with_launch_delay(mut self, delay: Duration) -> Self {
        self.supervisor = self.supervisor.with_launch_delay(delay);
        self
    }

    /// Starts the configured number of instances of every install.
    pub async fn launch(&self) -> Result<(), ServiceError> {
        let games = self.config.games()?;
        self.supervisor.launch(&games).await?;
        Ok(())
    }

    /// Instances currently running.
    pub async fn running(&self) -> Vec<RunningInstance> {
        self.supervisor.running().await
    }

    /// Returns true if every install is fully patched for its settings.
    ///
    /// Never changes anything on disk.
    pub async fn validate_game_versions(&self) -> Result<bool, ServiceError> {
        let games = self.config.games()?;
        Ok(self.patcher.validate(&games).await?)
    }

    /// Starts patching every install in the background.
    ///
    /// Fails immediately only if the configuration cannot be read; every
    /// later failure is reported through the returned [`PatchRun`].
    pub fn patch(&self) -> Result<PatchRun, ServiceError> {
        let games = self.config.games()?;
        let patcher = Arc::clone(&self.patcher);

        let (progress_tx, progress) = mpsc::channel(PROGRESS_CAPACITY);
        let (status_tx, status) = mpsc::channel(STATUS_CAPACITY);
        let (done_tx, done) = oneshot::channel();

        tokio::spawn(async move {
            let ok = match patcher.run(&games, &progress_tx, &status_tx).await {
                Ok(()) => true,
                Err(e) => {
                    error!(error = %e, "patch run failed");
                    let _ = status_tx.send(PatchStatus::Failed(e)).await;
                    false
                }
            };
            let _ = done_tx.send(ok);
        });

        Ok(PatchRun {
            progress,
            status,
            done,
        })
    }

    /// Applies the DEP workaround to the install at `install_dir`.
    pub fn apply_dep(&self, install_dir: &Path) -> Result<(), ServiceError> {
        self.platform.set_compatibility_fix(install_dir)?;
        info!(install = %install_dir.display(), "DEP fix applied");
        Ok(())
    }

    /// Selects `gateway` for the game and remembers it in the configuration.
    pub fn set_gateway(&self, gateway: &str) -> Result<(), ServiceError> {
        self.platform.set_network_gateway(gateway)?;
        self.config.update_gateway(gateway)?;
        info!(gateway, "gateway updated");
        Ok(())
    }

    /// Stops tracking process exits.
    pub fn shutdown(&self) {
        self.supervisor.shutdown();
    }
}
