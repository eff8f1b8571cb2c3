use crate::error::{AppError, FetchError};
use crate::pipeline::orchestration::{PipelineState, ProcessingStep, RunContext};
use crate::pipeline::services::Fetcher;
use async_trait::async_trait;
use tracing::info;

/// Downloads the source video to the run's video path.
pub struct DownloadStep {
    fetcher: Box<dyn Fetcher>,
}

impl DownloadStep {
    pub fn new(fetcher: Box<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ProcessingStep for DownloadStep {
    async fn process(&mut self, context: &mut RunContext) -> Result<(), AppError> {
        info!("Downloading video...");
        if let Some(parent) = context.paths.video.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        context.bytes_downloaded = self
            .fetcher
            .fetch(&context.video_url, &context.paths.video)
            .await?;
        info!(
            "Downloaded {} bytes to {} via {}",
            context.bytes_downloaded,
            context.paths.video.display(),
            self.fetcher.name()
        );
        Ok(())
    }

    fn stage(&self) -> PipelineState {
        PipelineState::Downloading
    }

    fn name(&self) -> &'static str {
        "DownloadStep"
    }
}
