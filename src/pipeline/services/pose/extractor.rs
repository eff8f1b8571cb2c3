use super::frame_service::{into_pose_error, PoseFrameService};
use super::model::{InferenceOptions, PoseModelLoader};
use crate::common::FramePath;
use crate::error::AppError;
use crate::pipeline::services::output::ResultJournal;
use crate::pipeline::types::PoseResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower::{Service, ServiceExt};
use tracing::{debug, info, instrument, warn};

/// What a decode or inference failure on one frame does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameFailurePolicy {
    /// The first failing frame fails the run.
    #[default]
    Abort,
    /// Failing frames are logged and left out of the results.
    Skip,
}

#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    pub results: Vec<PoseResult>,
    pub skipped: Vec<String>,
}

/// Loads the model once, then estimates a pose for every frame in order,
/// checkpointing each result to the journal before moving on.
pub struct PoseExtractor {
    loader: Box<dyn PoseModelLoader>,
    options: InferenceOptions,
    inference_timeout: Option<Duration>,
    failure_policy: FrameFailurePolicy,
}

impl PoseExtractor {
    pub fn new(loader: Box<dyn PoseModelLoader>, options: InferenceOptions) -> Self {
        Self {
            loader,
            options,
            inference_timeout: None,
            failure_policy: FrameFailurePolicy::default(),
        }
    }

    pub fn with_inference_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.inference_timeout = timeout;
        self
    }

    pub fn with_failure_policy(mut self, policy: FrameFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    #[instrument(skip_all, fields(frames = frames.len()))]
    pub async fn extract(
        &self,
        frames: &[FramePath],
        journal: &mut ResultJournal,
    ) -> Result<ExtractionOutcome, AppError> {
        let model = self.loader.load().await?;
        info!("Pose model ready: {}", model.name());
        let mut service = PoseFrameService::new(model, self.options)
            .with_timeout(self.inference_timeout)
            .boxed();

        let mut outcome = ExtractionOutcome::default();
        for frame in frames {
            let response = match service.ready().await {
                Ok(ready) => ready.call(frame.clone()).await,
                Err(e) => Err(e),
            };
            match response {
                Ok(result) => {
                    journal.append(&result).await?;
                    debug!(
                        "{} low-confidence keypoints in {}",
                        result.low_confidence_count(self.options.score_threshold),
                        frame.file_name()
                    );
                    info!("Pose extracted from {}", frame.file_name());
                    outcome.results.push(result);
                }
                Err(err) => {
                    let err = into_pose_error(err);
                    match self.failure_policy {
                        FrameFailurePolicy::Abort => return Err(err.into()),
                        FrameFailurePolicy::Skip => {
                            warn!("Skipping {}: {}", frame.file_name(), err);
                            outcome.skipped.push(frame.file_name().to_string());
                        }
                    }
                }
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PoseError;
    use crate::pipeline::services::testing::{write_frames, FakeModelLoader};

    #[tokio::test]
    async fn loads_once_and_keeps_frame_order() {
        let dir = tempfile::tempdir().unwrap();
        let frames = write_frames(dir.path(), 4);
        let loader = FakeModelLoader::new();
        let loads = loader.load_count();
        let extractor = PoseExtractor::new(Box::new(loader), InferenceOptions::default());
        let mut journal = ResultJournal::create(&dir.path().join("journal.jsonl"))
            .await
            .unwrap();

        let outcome = extractor.extract(&frames, &mut journal).await.unwrap();

        assert_eq!(loads.load(std::sync::atomic::Ordering::SeqCst), 1);
        let names: Vec<&str> = outcome.results.iter().map(|r| r.frame.as_str()).collect();
        assert_eq!(
            names,
            vec!["frame-0001.jpg", "frame-0002.jpg", "frame-0003.jpg", "frame-0004.jpg"]
        );
        assert!(outcome.results.iter().all(PoseResult::follows_schema));
        assert!(outcome.skipped.is_empty());
        assert_eq!(journal.len(), 4);
    }

    #[tokio::test]
    async fn abort_policy_keeps_completed_frames_in_journal() {
        let dir = tempfile::tempdir().unwrap();
        let frames = write_frames(dir.path(), 5);
        std::fs::write(frames[2].path(), b"corrupt").unwrap();
        let journal_path = dir.path().join("journal.jsonl");
        let extractor =
            PoseExtractor::new(Box::new(FakeModelLoader::new()), InferenceOptions::default());
        let mut journal = ResultJournal::create(&journal_path).await.unwrap();

        let err = extractor.extract(&frames, &mut journal).await.unwrap_err();

        assert!(matches!(err, AppError::Pose(PoseError::Decode { .. })));
        let saved = ResultJournal::read_entries(&journal_path).await.unwrap();
        let names: Vec<&str> = saved.iter().map(|r| r.frame.as_str()).collect();
        assert_eq!(names, vec!["frame-0001.jpg", "frame-0002.jpg"]);
    }

    #[tokio::test]
    async fn skip_policy_leaves_out_failing_frames() {
        let dir = tempfile::tempdir().unwrap();
        let frames = write_frames(dir.path(), 4);
        let extractor = PoseExtractor::new(
            Box::new(FakeModelLoader::new().failing_at(3)),
            InferenceOptions::default(),
        )
        .with_failure_policy(FrameFailurePolicy::Skip);
        let mut journal = ResultJournal::create(&dir.path().join("journal.jsonl"))
            .await
            .unwrap();

        let outcome = extractor.extract(&frames, &mut journal).await.unwrap();

        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.skipped, vec!["frame-0003.jpg".to_string()]);
    }

    #[tokio::test]
    async fn overrunning_frame_does_not_cost_the_next_one_its_budget() {
        let dir = tempfile::tempdir().unwrap();
        let frames = write_frames(dir.path(), 4);
        let extractor = PoseExtractor::new(
            Box::new(FakeModelLoader::new().slow_at(1, Duration::from_millis(600))),
            InferenceOptions::default(),
        )
        .with_inference_timeout(Some(Duration::from_millis(250)))
        .with_failure_policy(FrameFailurePolicy::Skip);
        let mut journal = ResultJournal::create(&dir.path().join("journal.jsonl"))
            .await
            .unwrap();

        let outcome = extractor.extract(&frames, &mut journal).await.unwrap();

        assert_eq!(outcome.skipped, vec!["frame-0001.jpg".to_string()]);
        let names: Vec<&str> = outcome.results.iter().map(|r| r.frame.as_str()).collect();
        assert_eq!(names, vec!["frame-0002.jpg", "frame-0003.jpg", "frame-0004.jpg"]);
    }

    #[tokio::test]
    async fn overrunning_frame_aborts_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let frames = write_frames(dir.path(), 3);
        let extractor = PoseExtractor::new(
            Box::new(FakeModelLoader::new().slow_at(2, Duration::from_millis(400))),
            InferenceOptions::default(),
        )
        .with_inference_timeout(Some(Duration::from_millis(100)));
        let mut journal = ResultJournal::create(&dir.path().join("journal.jsonl"))
            .await
            .unwrap();

        let err = extractor.extract(&frames, &mut journal).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Pose(PoseError::Timeout { ref frame, .. }) if frame == "frame-0002.jpg"
        ));
        assert_eq!(journal.len(), 1);
    }

    #[tokio::test]
    async fn load_failure_aborts_even_when_skipping() {
        let dir = tempfile::tempdir().unwrap();
        let frames = write_frames(dir.path(), 2);
        let extractor = PoseExtractor::new(
            Box::new(FakeModelLoader::new().unloadable()),
            InferenceOptions::default(),
        )
        .with_failure_policy(FrameFailurePolicy::Skip);
        let mut journal = ResultJournal::create(&dir.path().join("journal.jsonl"))
            .await
            .unwrap();

        let err = extractor.extract(&frames, &mut journal).await.unwrap_err();

        assert!(matches!(err, AppError::Pose(PoseError::ModelLoad { .. })));
        assert_eq!(journal.len(), 0);
    }
}
