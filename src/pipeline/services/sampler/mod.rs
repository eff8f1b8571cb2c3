pub mod ffmpeg;
pub mod frames_dir;

pub use ffmpeg::FfmpegSampler;
pub use frames_dir::FramesDirPolicy;

use crate::common::FramePath;
use crate::error::SampleError;
use async_trait::async_trait;
use std::path::Path;

/// Decomposes a video into still frames at a fixed rate.
#[async_trait]
pub trait VideoSampler: Send + Sync {
    /// Writes `frame-%04d.jpg` files into `output_dir` (created if missing)
    /// and returns the frames found there afterwards, in index order.
    async fn sample(
        &self,
        video: &Path,
        output_dir: &Path,
        rate: f64,
    ) -> Result<Vec<FramePath>, SampleError>;
    fn name(&self) -> &'static str;
}
