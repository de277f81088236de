//! Game instance supervisor.
//!
//! Launches as many processes per install as its configuration asks for,
//! counting the ones already running, and forgets each instance once the
//! platform reports that its process exited.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use slashlaunch_protocol::{ExitNotice, GameInstall, Platform, PlatformError};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

/// Pause between two launches. The game refuses to start several copies
/// in quick succession.
pub const DEFAULT_LAUNCH_DELAY: Duration = Duration::from_millis(1500);

/// Exit notifications buffered before the listener catches up.
const EXIT_QUEUE: usize = 16;

/// A launched game process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningInstance {
    pub pid: u32,
    pub install_id: String,
}

/// Errors returned by [`Supervisor::launch`].
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("launch {install_id}: {source}")]
    Launch {
        install_id: String,
        #[source]
        source: PlatformError,
    },
}

struct SupervisorState {
    running: Vec<RunningInstance>,
    /// Pids whose exit was reported before the launch recorded them.
    exited_early: HashSet<u32>,
}

/// Tracks running instances of every install.
///
/// Must be created inside a tokio runtime: the exit listener is spawned on
/// construction and stops on [`shutdown`](Self::shutdown) or drop.
pub struct Supervisor {
    platform: Arc<dyn Platform>,
    inner: Arc<Mutex<SupervisorState>>,
    exits: mpsc::Sender<ExitNotice>,
    cancel: CancellationToken,
    launch_delay: Duration,
}

impl Supervisor {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        let inner = Arc::new(Mutex::new(SupervisorState {
            running: Vec::new(),
            exited_early: HashSet::new(),
        }));
        let (exits, rx) = mpsc::channel(EXIT_QUEUE);
        let cancel = CancellationToken::new();

        tokio::spawn(listen_for_exits(rx, Arc::clone(&inner), cancel.clone()));

        Self {
            platform,
            inner,
            exits,
            cancel,
            launch_delay: DEFAULT_LAUNCH_DELAY,
        }
    }

    /// Overrides the pause between launches.
    pub fn with_launch_delay(mut self, delay: Duration) -> Self {
        self.launch_delay = delay;
        self
    }

    /// Brings every install up to its desired instance count.
    ///
    /// Consecutive launches are spaced by the launch delay; there is no
    /// pause before the first or after the last one. Only failures to start
    /// a process are reported. A process that dies later is removed from the
    /// running set in the background.
    pub async fn launch(&self, installs: &[GameInstall]) -> Result<(), SupervisorError> {
        let mut launched_any = false;
        for install in installs {
            let running = self.running_count(&install.id).await;
            let wanted = usize::try_from(install.instances).unwrap_or(usize::MAX);
            let to_launch = wanted.saturating_sub(running);

            if to_launch == 0 {
                tracing::debug!(install = %install.id, running, "enough instances running");
                continue;
            }

            for _ in 0..to_launch {
                if launched_any {
                    tokio::time::sleep(self.launch_delay).await;
                }
                self.launch_one(install).await?;
                launched_any = true;
            }
        }
        Ok(())
    }

    async fn launch_one(&self, install: &GameInstall) -> Result<(), SupervisorError> {
        let pid = self
            .platform
            .launch_process(&install.location, &install.flags, self.exits.clone())
            .map_err(|source| SupervisorError::Launch {
                install_id: install.id.clone(),
                source,
            })?;

        let mut state = self.inner.lock().await;
        if state.exited_early.remove(&pid) {
            tracing::warn!(install = %install.id, pid, "process exited before it was tracked");
            return Ok(());
        }
        state.running.push(RunningInstance {
            pid,
            install_id: install.id.clone(),
        });
        tracing::info!(install = %install.id, pid, "instance launched");
        Ok(())
    }

    /// Snapshot of the running instances.
    pub async fn running(&self) -> Vec<RunningInstance> {
        self.inner.lock().await.running.clone()
    }

    /// Number of running instances of one install.
    pub async fn running_count(&self, install_id: &str) -> usize {
        self.inner
            .lock()
            .await
            .running
            .iter()
            .filter(|i| i.install_id == install_id)
            .count()
    }

    /// Stops the exit listener.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn listen_for_exits(
    mut rx: mpsc::Receiver<ExitNotice>,
    inner: Arc<Mutex<SupervisorState>>,
    cancel: CancellationToken,
) {
    loop {
        let notice = tokio::select! {
            _ = cancel.cancelled() => break,
            notice = rx.recv() => match notice {
                Some(n) => n,
                None => break,
            },
        };

        if let Some(err) = &notice.error {
            tracing::error!(pid = ?notice.pid, error = %err, "game process exited with error");
        }

        let Some(pid) = notice.pid else {
            continue;
        };

        let mut state = inner.lock().await;
        match state.running.iter().position(|i| i.pid == pid) {
            Some(idx) => {
                let instance = state.running.remove(idx);
                tracing::info!(install = %instance.install_id, pid, "instance exited");
            }
            None => {
                state.exited_early.insert(pid);
            }
        }
    }
    tracing::debug!("exit listener stopped");
}
