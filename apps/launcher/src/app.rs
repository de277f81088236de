//! Command execution.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use slashlaunch_patcher::PatchStatus;
use slashlaunch_protocol::{FetchError, FetchFuture, RemoteSource};
use slashlaunch_remote::HttpSource;
use slashlaunch_service::{ConfigStore, LauncherService, PatchRun};

use crate::Command;
use crate::config::FileConfigStore;

/// How often `launch` checks whether every instance has exited.
const RUNNING_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Stand-in source for commands that never fetch anything.
struct NoRemote;

impl RemoteSource for NoRemote {
    fn fetch(&self, path: &str) -> FetchFuture<'_> {
        let path = path.to_string();
        Box::pin(async move {
            Err(FetchError::Transport(format!(
                "{path}: patch_url is not configured"
            )))
        })
    }
}

pub async fn run(command: Command, config_path: PathBuf) -> anyhow::Result<()> {
    let store = Arc::new(FileConfigStore::new(config_path));
    let config = store.load()?;

    if let Command::Games = command {
        for game in &config.games {
            let mut layers = vec!["core"];
            if game.maphack {
                layers.push("maphack");
            }
            if game.hd {
                layers.push("hd");
            }
            println!(
                "{}\t{}\tinstances={}\t{}",
                game.id,
                game.location.display(),
                game.instances,
                layers.join(",")
            );
        }
        return Ok(());
    }

    let needs_remote = matches!(command, Command::Patch | Command::Validate);
    let source: Arc<dyn RemoteSource> = if config.patch_url.is_empty() {
        if needs_remote {
            anyhow::bail!("patch_url is not set in {}", store.path().display());
        }
        Arc::new(NoRemote)
    } else {
        Arc::new(HttpSource::new(&config.patch_url).context("patch_url")?)
    };

    let service = LauncherService::new(
        store.clone() as Arc<dyn ConfigStore>,
        source,
        slashlaunch_platform::native(),
    )
    .with_launch_delay(Duration::from_millis(config.launch_delay_ms));

    match command {
        Command::Patch => patch(&service).await?,
        Command::Validate => {
            if service.validate_game_versions().await? {
                println!("all installs are up to date");
            } else {
                println!("installs need patching, run `slashlaunch patch`");
            }
        }
        Command::Launch => launch(&service).await?,
        Command::Dep { path } => service.apply_dep(&path)?,
        Command::Gateway { name } => service.set_gateway(&name)?,
        Command::Games => {}
    }

    service.shutdown();
    Ok(())
}

/// Runs a patch, printing status lines and a percentage to stderr.
async fn patch(service: &LauncherService) -> anyhow::Result<()> {
    let PatchRun {
        mut progress,
        mut status,
        done,
    } = service.patch()?;

    let mut failure = None;
    let mut last_percent = None;
    let (mut progress_open, mut status_open) = (true, true);

    while progress_open || status_open {
        tokio::select! {
            value = progress.recv(), if progress_open => match value {
                Some(fraction) => {
                    let percent = (fraction * 100.0).round() as u32;
                    if last_percent != Some(percent) {
                        last_percent = Some(percent);
                        eprint!("\r{percent:>3}%");
                        let _ = std::io::stderr().flush();
                    }
                }
                None => progress_open = false,
            },
            event = status.recv(), if status_open => match event {
                Some(PatchStatus::Message(message)) => {
                    if last_percent.take().is_some() {
                        eprintln!();
                    }
                    eprintln!("{message}");
                }
                Some(PatchStatus::Failed(err)) => failure = Some(err),
                None => status_open = false,
            },
        }
    }
    if last_percent.is_some() {
        eprintln!();
    }

    if let Some(err) = failure {
        return Err(err).context("patching failed");
    }
    if !done.await.unwrap_or(false) {
        anyhow::bail!("patch run ended unexpectedly");
    }
    println!("all installs are up to date");
    Ok(())
}

/// Launches instances, then stays resident until they exit or Ctrl-C.
async fn launch(service: &LauncherService) -> anyhow::Result<()> {
    service.launch().await?;

    let running = service.running().await;
    for instance in &running {
        println!("{}\tpid {}", instance.install_id, instance.pid);
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, no longer tracking instances");
                break;
            }
            _ = tokio::time::sleep(RUNNING_POLL_INTERVAL) => {
                if service.running().await.is_empty() {
                    tracing::info!("all instances exited");
                    break;
                }
            }
        }
    }
    Ok(())
}
