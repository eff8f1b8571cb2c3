pub mod orchestration;
pub mod services;
pub mod steps;
pub mod types;

pub use orchestration::{PipelineState, ProcessingPipeline, RunContext};
pub use types::{BodyPart, Keypoint, PoseResult};
