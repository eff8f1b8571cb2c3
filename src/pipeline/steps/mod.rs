pub mod download_step;
pub mod frame_sampling_step;
pub mod pose_detection_step;
pub mod result_writing_step;

pub use download_step::DownloadStep;
pub use frame_sampling_step::FrameSamplingStep;
pub use pose_detection_step::PoseDetectionStep;
pub use result_writing_step::ResultWritingStep;
