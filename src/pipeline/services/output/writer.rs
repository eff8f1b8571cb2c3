use crate::error::OutputError;
use crate::pipeline::types::PoseResult;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// Writes the full result set as pretty-printed JSON.
pub struct ResultWriter {
    path: PathBuf,
}

impl ResultWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the output file. Readers see either the old file or the
    /// complete new one, never a partial write.
    #[instrument(skip_all, fields(path = %self.path.display(), results = results.len()))]
    pub async fn write(&self, results: &[PoseResult]) -> Result<(), OutputError> {
        let json = serde_json::to_vec_pretty(results)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| OutputError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let staging = staging_path(&self.path);
        let written = match fs::write(&staging, &json).await {
            Ok(()) => fs::rename(&staging, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(source) = written {
            if let Err(cleanup) = fs::remove_file(&staging).await {
                warn!("Could not remove {}: {}", staging.display(), cleanup);
            }
            return Err(OutputError::Io {
                path: self.path.clone(),
                source,
            });
        }

        info!("Wrote {} pose results to {}", results.len(), self.path.display());
        Ok(())
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("results"));
    name.push(".tmp");
    path.with_file_name(name)
}
