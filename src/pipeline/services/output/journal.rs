use crate::error::OutputError;
use crate::pipeline::types::PoseResult;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> OutputError + '_ {
    move |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// JSON-Lines checkpoint of completed pose results.
///
/// Every entry is flushed before `append` returns, so a failed run leaves
/// behind exactly the frames that finished.
pub struct ResultJournal {
    path: PathBuf,
    file: File,
    entries: usize,
}

impl ResultJournal {
    /// Starts an empty journal, truncating whatever a previous run left.
    pub async fn create(path: &Path) -> Result<Self, OutputError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(io_error(parent))?;
        }
        let file = File::create(path).await.map_err(io_error(path))?;
        debug!("Opened checkpoint journal {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file,
            entries: 0,
        })
    }

    pub async fn append(&mut self, result: &PoseResult) -> Result<(), OutputError> {
        let mut line = serde_json::to_vec(result)?;
        line.push(b'\n');
        self.file
            .write_all(&line)
            .await
            .map_err(io_error(&self.path))?;
        self.file.flush().await.map_err(io_error(&self.path))?;
        self.entries += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub async fn read_entries(path: &Path) -> Result<Vec<PoseResult>, OutputError> {
        let contents = fs::read_to_string(path).await.map_err(io_error(path))?;
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(OutputError::from))
            .collect()
    }
}

/// Deletes a journal file by path. A journal that is already gone is fine.
pub async fn remove(path: &Path) -> Result<(), OutputError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error(path)(e)),
    }
}
