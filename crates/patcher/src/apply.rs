//! Staged download and promotion of planned files.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use slashlaunch_protocol::{Layer, RemoteSource, localize_path};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::PatchError;
use crate::plan::PatchPlan;
use crate::progress::WriteCounter;

/// Suffix of files that are downloaded but not yet promoted.
pub const STAGING_SUFFIX: &str = ".tmp";

/// Copy buffer size.
const BUF_SIZE: usize = 32 * 1024;

/// Returns the staging name of `final_path`.
pub fn staging_path(final_path: &Path) -> PathBuf {
    let mut name = OsString::from(final_path.as_os_str());
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}

/// Downloads every planned file of `layer` into `install_dir`.
///
/// Files are written under their staging name first. Only when all of them
/// downloaded successfully are they renamed to their final names, in plan
/// order. On a download failure nothing is promoted; removing the staged
/// leftovers is up to the caller (see [`clean_up_staged`](crate::clean_up_staged)).
///
/// Every planned name is resolved before the first fetch. A name outside
/// `install_dir` fails the whole layer without writing anything.
///
/// Progress restarts at 0 and is reported against `plan.total_bytes`.
pub async fn apply(
    source: &dyn RemoteSource,
    plan: &PatchPlan,
    layer: Layer,
    install_dir: &Path,
    progress: &mpsc::Sender<f32>,
) -> Result<(), PatchError> {
    let targets = plan
        .files
        .iter()
        .map(|name| localize_path(install_dir, name).map(|target| (name, target)))
        .collect::<Result<Vec<_>, _>>()?;

    let _ = progress.send(0.0).await;

    let mut counter = WriteCounter::new(plan.total_bytes, progress);
    let mut staged = Vec::with_capacity(plan.len());

    for (name, target) in targets {
        let tmp = staging_path(&target);

        download(source, &layer.remote_path(name), &tmp, &mut counter).await?;
        debug!(file = %name, %layer, "staged");

        staged.push((tmp, target));
    }

    // Every download succeeded, promote them all.
    for (tmp, target) in &staged {
        tokio::fs::rename(tmp, target)
            .await
            .map_err(|source| PatchError::Staging {
                path: target.clone(),
                source,
            })?;
    }

    info!(
        install = %install_dir.display(),
        %layer,
        files = staged.len(),
        bytes = counter.written(),
        "layer applied"
    );
    Ok(())
}

/// Streams one remote file into `tmp`.
async fn download(
    source: &dyn RemoteSource,
    remote_path: &str,
    tmp: &Path,
    counter: &mut WriteCounter<'_>,
) -> Result<(), PatchError> {
    let staging = |source| PatchError::Staging {
        path: tmp.to_path_buf(),
        source,
    };

    let mut body = source
        .fetch(remote_path)
        .await
        .map_err(|source| PatchError::Fetch {
            path: remote_path.to_string(),
            source,
        })?;

    if let Some(parent) = tmp.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(staging)?;
    }

    let mut out = tokio::fs::File::create(tmp).await.map_err(staging)?;
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = body.read(&mut buf).await.map_err(staging)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n]).await.map_err(staging)?;
        counter.add(n).await;
    }

    out.flush().await.map_err(staging)?;
    out.sync_all().await.map_err(staging)?;
    Ok(())
}
