use crate::error::{ModelError, PoseError};
use crate::pipeline::types::{BodyPart, Keypoint, KEYPOINT_COUNT};
use async_trait::async_trait;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Options applied to every single-pose estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceOptions {
    /// Mirror x coordinates around the frame's vertical centre line.
    pub flip_horizontal: bool,
    /// Candidates considered before the best one is kept.
    pub max_detections: usize,
    /// Keypoints under this score count as low confidence. They are kept.
    pub score_threshold: f32,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            flip_horizontal: false,
            max_detections: 5,
            score_threshold: 0.5,
        }
    }
}

/// One detected subject.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseCandidate {
    pub score: f32,
    pub keypoints: Vec<Keypoint>,
}

impl PoseCandidate {
    pub fn new(score: f32, keypoints: Vec<Keypoint>) -> Self {
        Self { score, keypoints }
    }
}

/// Highest-scoring candidate among the first `max_detections`.
pub fn select_primary(
    candidates: Vec<PoseCandidate>,
    max_detections: usize,
) -> Option<PoseCandidate> {
    candidates
        .into_iter()
        .take(max_detections)
        .filter(|candidate| !candidate.score.is_nan())
        .max_by(|a, b| a.score.total_cmp(&b.score))
}

/// Puts keypoints into schema order, rejecting anything that is not exactly
/// one keypoint per landmark.
fn into_schema_order(mut keypoints: Vec<Keypoint>) -> Result<Vec<Keypoint>, ModelError> {
    if keypoints.len() != KEYPOINT_COUNT {
        return Err(ModelError::Schema {
            expected: KEYPOINT_COUNT,
            found: keypoints.len(),
        });
    }
    keypoints.sort_by_key(|keypoint| {
        BodyPart::ALL
            .iter()
            .position(|part| *part == keypoint.part)
            .unwrap_or(KEYPOINT_COUNT)
    });
    let ordered = keypoints
        .iter()
        .zip(BodyPart::ALL)
        .all(|(keypoint, part)| keypoint.part == part);
    if !ordered {
        return Err(ModelError::Runtime(
            "model returned duplicate landmarks".to_string(),
        ));
    }
    Ok(keypoints)
}

/// A loaded pose-estimation network.
///
/// Implementations only report candidates; subject selection, schema checks
/// and flipping are shared in [`PoseModel::estimate_single_pose`].
pub trait PoseModel: Send {
    /// Candidate poses for one RGB frame, with positions in frame pixels.
    fn infer(&mut self, pixels: &RgbImage) -> Result<Vec<PoseCandidate>, ModelError>;

    fn name(&self) -> &'static str;

    /// Keypoints of the single most confident subject. A frame without any
    /// subject yields every landmark at the origin with a zero score, so the
    /// schema stays the same across frames.
    fn estimate_single_pose(
        &mut self,
        pixels: &RgbImage,
        options: &InferenceOptions,
    ) -> Result<Vec<Keypoint>, ModelError> {
        let candidates = self.infer(pixels)?;
        let keypoints = match select_primary(candidates, options.max_detections) {
            Some(candidate) => candidate.keypoints,
            None => BodyPart::ALL.iter().copied().map(Keypoint::undetected).collect(),
        };
        let mut keypoints = into_schema_order(keypoints)?;
        if options.flip_horizontal {
            let width = pixels.width() as f32;
            for keypoint in &mut keypoints {
                keypoint.position.x = width - keypoint.position.x;
            }
        }
        Ok(keypoints)
    }
}

/// Loads a [`PoseModel`]. Called once per run, when pose detection starts.
#[async_trait]
pub trait PoseModelLoader: Send + Sync {
    async fn load(&self) -> Result<Box<dyn PoseModel>, PoseError>;
    fn name(&self) -> &'static str;
}
