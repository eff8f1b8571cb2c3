use serde::{Deserialize, Serialize};

use super::keypoint::{BodyPart, Keypoint};

/// Keypoints detected in one frame, in model schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseResult {
    pub frame: String,
    pub keypoints: Vec<Keypoint>,
}

impl PoseResult {
    pub fn new(frame: impl Into<String>, keypoints: Vec<Keypoint>) -> Self {
        Self {
            frame: frame.into(),
            keypoints,
        }
    }

    pub fn low_confidence_count(&self, threshold: f32) -> usize {
        self.keypoints
            .iter()
            .filter(|keypoint| !keypoint.is_confident(threshold))
            .count()
    }

    /// True when the keypoints follow [`BodyPart::ALL`] exactly.
    pub fn follows_schema(&self) -> bool {
        self.keypoints.len() == BodyPart::ALL.len()
            && self
                .keypoints
                .iter()
                .zip(BodyPart::ALL)
                .all(|(keypoint, part)| keypoint.part == part)
    }
}
