//! Decoding of MoveNet output tensors.
//!
//! MoveNet reports normalized `y, x, score` triplets in COCO landmark order.
//! The single-pose variant emits `[1, 1, 17, 3]`; the multi-pose variant emits
//! `[1, N, 56]` where each row is 17 triplets followed by a bounding box
//! (`ymin, xmin, ymax, xmax`) and the detection score.

use super::model::PoseCandidate;
use crate::error::ModelError;
use crate::pipeline::types::{BodyPart, Keypoint, KEYPOINT_COUNT};
use ndarray::ArrayViewD;
use serde::{Deserialize, Serialize};

const MULTI_POSE_ROW: usize = KEYPOINT_COUNT * 3 + 5;
const MULTI_POSE_SCORE: usize = MULTI_POSE_ROW - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLayout {
    #[default]
    SinglePose,
    MultiPose,
}

/// Turns a raw output tensor into candidates in `width` x `height` pixel space.
pub fn decode_output(
    layout: OutputLayout,
    output: &ArrayViewD<'_, f32>,
    width: u32,
    height: u32,
) -> Result<Vec<PoseCandidate>, ModelError> {
    let shape = output.shape();
    let (width, height) = (width as f32, height as f32);
    match layout {
        OutputLayout::SinglePose => {
            if shape != [1, 1, KEYPOINT_COUNT, 3] {
                return Err(ModelError::OutputShape(shape.to_vec()));
            }
            let keypoints: Vec<Keypoint> = BodyPart::ALL
                .iter()
                .enumerate()
                .map(|(i, part)| {
                    Keypoint::new(
                        *part,
                        output[[0, 0, i, 1]] * width,
                        output[[0, 0, i, 0]] * height,
                        output[[0, 0, i, 2]],
                    )
                })
                .collect();
            let score = mean_score(&keypoints);
            Ok(vec![PoseCandidate::new(score, keypoints)])
        }
        OutputLayout::MultiPose => {
            if shape.len() != 3 || shape[0] != 1 || shape[2] != MULTI_POSE_ROW {
                return Err(ModelError::OutputShape(shape.to_vec()));
            }
            let candidates = (0..shape[1])
                .map(|d| {
                    let keypoints = BodyPart::ALL
                        .iter()
                        .enumerate()
                        .map(|(i, part)| {
                            Keypoint::new(
                                *part,
                                output[[0, d, i * 3 + 1]] * width,
                                output[[0, d, i * 3]] * height,
                                output[[0, d, i * 3 + 2]],
                            )
                        })
                        .collect();
                    PoseCandidate::new(output[[0, d, MULTI_POSE_SCORE]], keypoints)
                })
                .collect();
            Ok(candidates)
        }
    }
}

fn mean_score(keypoints: &[Keypoint]) -> f32 {
    if keypoints.is_empty() {
        return 0.0;
    }
    keypoints.iter().map(|keypoint| keypoint.score).sum::<f32>() / keypoints.len() as f32
}
