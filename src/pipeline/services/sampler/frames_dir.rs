use crate::common::FramePath;
use crate::error::SampleError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio_stream::wrappers::ReadDirStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

/// What happens to frames left behind by an earlier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramesDirPolicy {
    /// Keep existing files; stale frames are mixed into the run.
    Reuse,
    /// Delete stale `frame-*.jpg` files before sampling.
    #[default]
    Clear,
    /// Sample into a fresh `<frames_dir>/<run id>` directory.
    RunScoped,
}

pub fn resolve(base: &Path, policy: FramesDirPolicy, run_id: Uuid) -> PathBuf {
    match policy {
        FramesDirPolicy::RunScoped => base.join(run_id.to_string()),
        FramesDirPolicy::Reuse | FramesDirPolicy::Clear => base.to_path_buf(),
    }
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> SampleError + '_ {
    move |source| SampleError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Ensures `dir` exists and applies `policy` to its contents. Returns the
/// number of stale frames removed.
pub async fn prepare(dir: &Path, policy: FramesDirPolicy) -> Result<usize, SampleError> {
    tokio::fs::create_dir_all(dir).await.map_err(io_error(dir))?;
    if policy != FramesDirPolicy::Clear {
        return Ok(0);
    }
    let stale = list_frames(dir).await?;
    for frame in &stale {
        tokio::fs::remove_file(frame.path())
            .await
            .map_err(io_error(frame.path()))?;
    }
    if !stale.is_empty() {
        tracing::info!("Removed {} stale frames from {}", stale.len(), dir.display());
    }
    Ok(stale.len())
}

/// Frame files in `dir`, ordered by sequence index.
pub async fn list_frames(dir: &Path) -> Result<Vec<FramePath>, SampleError> {
    let entries = tokio::fs::read_dir(dir).await.map_err(io_error(dir))?;
    let mut stream = ReadDirStream::new(entries);
    let mut frames = Vec::new();
    while let Some(entry) = stream.next().await {
        let entry = entry.map_err(io_error(dir))?;
        let is_file = entry
            .file_type()
            .await
            .map_err(io_error(&entry.path()))?
            .is_file();
        if !is_file {
            continue;
        }
        if let Some(frame) = FramePath::parse(entry.path()) {
            frames.push(frame);
        }
    }
    frames.sort();
    Ok(frames)
}
