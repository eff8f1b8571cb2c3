mod keypoint;
mod pose_result;

pub use keypoint::{BodyPart, Keypoint, Position, KEYPOINT_COUNT};
pub use pose_result::PoseResult;
