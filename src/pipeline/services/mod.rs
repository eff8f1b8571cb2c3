pub mod fetcher;
pub mod output;
pub mod pose;
pub mod sampler;
#[cfg(test)]
pub(crate) mod testing;

pub use fetcher::{Fetcher, HttpFetcher};
pub use output::{ResultJournal, ResultWriter};
pub use pose::{PoseExtractor, PoseModelLoader};
pub use sampler::{FfmpegSampler, FramesDirPolicy, VideoSampler};
