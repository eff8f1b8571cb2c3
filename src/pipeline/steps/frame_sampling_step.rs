use crate::error::AppError;
use crate::pipeline::orchestration::{PipelineState, ProcessingStep, RunContext};
use crate::pipeline::services::sampler::frames_dir;
use crate::pipeline::services::{FramesDirPolicy, VideoSampler};
use async_trait::async_trait;
use tracing::info;

/// Prepares the frames directory according to its policy, then samples the
/// downloaded video into it.
pub struct FrameSamplingStep {
    sampler: Box<dyn VideoSampler>,
    policy: FramesDirPolicy,
    sampling_rate: f64,
}

impl FrameSamplingStep {
    pub fn new(sampler: Box<dyn VideoSampler>, policy: FramesDirPolicy, sampling_rate: f64) -> Self {
        Self {
            sampler,
            policy,
            sampling_rate,
        }
    }
}

#[async_trait]
impl ProcessingStep for FrameSamplingStep {
    async fn process(&mut self, context: &mut RunContext) -> Result<(), AppError> {
        info!("Extracting frames at {} fps...", self.sampling_rate);
        frames_dir::prepare(&context.paths.frames_dir, self.policy).await?;

        context.frames = self
            .sampler
            .sample(
                &context.paths.video,
                &context.paths.frames_dir,
                self.sampling_rate,
            )
            .await?;
        info!(
            "Extracted {} frames into {}",
            context.frames.len(),
            context.paths.frames_dir.display()
        );
        Ok(())
    }

    fn stage(&self) -> PipelineState {
        PipelineState::ExtractingFrames
    }

    fn name(&self) -> &'static str {
        "FrameSamplingStep"
    }
}
