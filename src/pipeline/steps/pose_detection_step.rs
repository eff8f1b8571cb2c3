use crate::error::AppError;
use crate::pipeline::orchestration::{PipelineState, ProcessingStep, RunContext};
use crate::pipeline::services::{PoseExtractor, ResultJournal};
use async_trait::async_trait;
use tracing::{info, warn};

pub struct PoseDetectionStep {
    extractor: PoseExtractor,
}

impl PoseDetectionStep {
    pub fn new(extractor: PoseExtractor) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl ProcessingStep for PoseDetectionStep {
    async fn process(&mut self, context: &mut RunContext) -> Result<(), AppError> {
        info!("Detecting poses in {} frames...", context.frames.len());
        let mut journal = ResultJournal::create(&context.paths.journal).await?;
        let outcome = self.extractor.extract(&context.frames, &mut journal).await?;

        if !outcome.skipped.is_empty() {
            warn!("Skipped {} frames", outcome.skipped.len());
        }
        context.results = outcome.results;
        context.skipped_frames = outcome.skipped;
        Ok(())
    }

    fn stage(&self) -> PipelineState {
        PipelineState::DetectingPoses
    }

    fn name(&self) -> &'static str {
        "PoseDetectionStep"
    }
}
