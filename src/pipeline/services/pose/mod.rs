pub mod extractor;
pub mod frame_service;
pub mod model;
pub mod movenet;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod tensor;

pub use extractor::{ExtractionOutcome, FrameFailurePolicy, PoseExtractor};
pub use frame_service::PoseFrameService;
pub use model::{InferenceOptions, PoseCandidate, PoseModel, PoseModelLoader};
pub use movenet::OutputLayout;
#[cfg(feature = "onnx")]
pub use onnx::{OnnxModelLoader, OnnxPoseModel};
