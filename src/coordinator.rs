use crate::{
    config::Configuration,
    error::AppError,
    pipeline::orchestration::{
        PipelineState, ProcessingPipeline, RunContext, StepInstrumentation,
    },
    pipeline::services::{Fetcher, PoseExtractor, PoseModelLoader, VideoSampler},
    pipeline::steps::{DownloadStep, FrameSamplingStep, PoseDetectionStep, ResultWritingStep},
};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub frames: usize,
    pub poses_written: usize,
    pub skipped_frames: Vec<String>,
    pub output: PathBuf,
    pub stage_durations: IndexMap<PipelineState, Duration>,
    pub total: Duration,
}

impl RunSummary {
    fn from_context(context: &RunContext) -> Self {
        Self {
            run_id: context.run_id,
            started_at: context.started_at,
            frames: context.frames.len(),
            poses_written: context.results.len(),
            skipped_frames: context.skipped_frames.clone(),
            output: context.paths.output.clone(),
            stage_durations: context.phase_timings.get_all_stage_durations().clone(),
            total: context.processing_start.elapsed(),
        }
    }
}

fn log_stage_durations(context: &RunContext) {
    for (stage, duration) in context.phase_timings.get_all_stage_durations() {
        info!("{:<18} {:>8.2?}", stage.name(), duration);
    }
}

/// Drives one download, sample, detect and write run.
pub struct Coordinator {
    configuration: Configuration,
    pipeline: ProcessingPipeline,
}

impl Coordinator {
    fn new(configuration: Configuration, pipeline: ProcessingPipeline) -> Self {
        Self {
            configuration,
            pipeline,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<RunSummary, AppError> {
        let mut context = RunContext::new(&self.configuration);
        info!(
            run_id = %context.run_id,
            "Starting pose extraction for {}",
            context.video_url
        );

        let outcome = self.pipeline.process(&mut context).await;
        log_stage_durations(&context);
        outcome?;

        let summary = RunSummary::from_context(&context);
        info!(
            "Wrote {} poses for {} frames to {} in {:.2?}",
            summary.poses_written,
            summary.frames,
            summary.output.display(),
            summary.total
        );
        Ok(summary)
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    fetcher: Option<Box<dyn Fetcher>>,
    sampler: Option<Box<dyn VideoSampler>>,
    model_loader: Option<Box<dyn PoseModelLoader>>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            fetcher: None,
            sampler: None,
            model_loader: None,
        }
    }

    // Sets the video URL, this will override the default configuration.
    pub fn video_url(mut self, video_url: String) -> Self {
        self.configuration.video_url = video_url;
        self
    }

    // Sets the working directory, this will override the default configuration.
    pub fn work_dir(mut self, work_dir: PathBuf) -> Self {
        self.configuration.work_dir = work_dir;
        self
    }

    // Adjusts the sampling rate, this will override the default configuration.
    pub fn sampling_rate(mut self, sampling_rate: f64) -> Self {
        self.configuration.sampling_rate = sampling_rate;
        self
    }

    // Sets the model file, this will override the default configuration.
    pub fn model_path(mut self, model_path: PathBuf) -> Self {
        self.configuration.model.path = model_path;
        self
    }

    pub fn fetcher(mut self, fetcher: Box<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn sampler(mut self, sampler: Box<dyn VideoSampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn model_loader(mut self, model_loader: Box<dyn PoseModelLoader>) -> Self {
        self.model_loader = Some(model_loader);
        self
    }

    pub fn build(self) -> Result<Coordinator, AppError> {
        self.configuration.validate()?;
        let fetcher = self
            .fetcher
            .ok_or(AppError::Pipeline("Fetcher not set".to_string()))?;
        let sampler = self
            .sampler
            .ok_or(AppError::Pipeline("Video sampler not set".to_string()))?;
        let model_loader = self
            .model_loader
            .ok_or(AppError::Pipeline("Pose model loader not set".to_string()))?;

        let configuration = self.configuration;
        let extractor = PoseExtractor::new(model_loader, configuration.inference)
            .with_inference_timeout(configuration.inference_timeout())
            .with_failure_policy(configuration.frame_failure_policy);

        let pipeline = ProcessingPipeline::new()
            .add_step(Box::new(DownloadStep::new(fetcher).instrumented("download")))
            .add_step(Box::new(
                FrameSamplingStep::new(
                    sampler,
                    configuration.frames_dir_policy,
                    configuration.sampling_rate,
                )
                .instrumented("frame_sampling"),
            ))
            .add_step(Box::new(
                PoseDetectionStep::new(extractor).instrumented("pose_detection"),
            ))
            .add_step(Box::new(ResultWritingStep.instrumented("result_writing")));

        Ok(Coordinator::new(configuration, pipeline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, FetchError, PoseError};
    use crate::pipeline::services::output::ResultJournal;
    use crate::pipeline::services::pose::FrameFailurePolicy;
    use crate::pipeline::services::sampler::frames_dir;
    use crate::pipeline::services::testing::{FakeFetcher, FakeModelLoader, FakeSampler};
    use crate::pipeline::types::{BodyPart, PoseResult};
    use std::path::Path;
    use std::sync::atomic::Ordering;

    fn configuration(work_dir: &Path) -> Configuration {
        Configuration {
            work_dir: work_dir.to_path_buf(),
            ..Configuration::default()
        }
    }

    fn read_output(path: &Path) -> Vec<PoseResult> {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn completed_run_writes_one_result_per_frame() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FakeModelLoader::new();
        let loads = loader.load_count();
        let mut coordinator = CoordinatorBuilder::new(configuration(dir.path()))
            .fetcher(Box::new(FakeFetcher::ok()))
            .sampler(Box::new(FakeSampler::new(6)))
            .model_loader(Box::new(loader))
            .build()
            .expect("Failed to build coordinator");

        let summary = coordinator.run().await.unwrap();

        let frames = frames_dir::list_frames(&dir.path().join("frames"))
            .await
            .unwrap();
        let results = read_output(&summary.output);
        assert_eq!(results.len(), frames.len());
        assert_eq!(summary.frames, 6);
        assert_eq!(summary.poses_written, 6);
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        for (result, frame) in results.iter().zip(&frames) {
            assert_eq!(result.frame, frame.file_name());
            let parts: Vec<BodyPart> = result.keypoints.iter().map(|k| k.part).collect();
            assert_eq!(parts, BodyPart::ALL.to_vec());
            assert!(result
                .keypoints
                .iter()
                .all(|k| (0.0..=1.0).contains(&k.score) && k.has_finite_position()));
        }
        assert!(results.windows(2).all(|pair| pair[0].frame < pair[1].frame));
        assert!(dir.path().join("video.mov").exists());
        assert!(!dir.path().join("keypoints.partial.jsonl").exists());
        assert_eq!(
            summary.stage_durations.keys().copied().collect::<Vec<_>>(),
            vec![
                PipelineState::Downloading,
                PipelineState::ExtractingFrames,
                PipelineState::DetectingPoses,
                PipelineState::WritingResults,
            ]
        );
    }

    #[tokio::test]
    async fn failed_download_stops_before_frames_and_model() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FakeModelLoader::new();
        let loads = loader.load_count();
        let sampler = FakeSampler::new(4);
        let sampled = sampler.videos();
        let mut coordinator = CoordinatorBuilder::new(configuration(dir.path()))
            .fetcher(Box::new(FakeFetcher::with_status(404)))
            .sampler(Box::new(sampler))
            .model_loader(Box::new(loader))
            .build()
            .unwrap();

        let err = coordinator.run().await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Fetch(FetchError::Status { status: 404, .. })
        ));
        assert!(sampled.lock().unwrap().is_empty());
        assert!(!dir.path().join("frames").exists());
        assert!(!dir.path().join("keypoints.json").exists());
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rerun_with_clear_policy_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = CoordinatorBuilder::new(configuration(dir.path()))
            .fetcher(Box::new(FakeFetcher::ok()))
            .sampler(Box::new(FakeSampler::new(3)))
            .model_loader(Box::new(FakeModelLoader::new()))
            .build()
            .unwrap();

        let first = coordinator.run().await.unwrap();
        let first_results = read_output(&first.output);
        std::fs::write(dir.path().join("frames").join("frame-0042.jpg"), b"stale").unwrap();
        let second = coordinator.run().await.unwrap();
        let second_results = read_output(&second.output);

        assert_ne!(first.run_id, second.run_id);
        assert_eq!(first_results.len(), 3);
        assert_eq!(second_results.len(), 3);
        assert_eq!(first_results, second_results);
    }

    #[tokio::test]
    async fn aborted_run_keeps_completed_frames_in_journal() {
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = CoordinatorBuilder::new(configuration(dir.path()))
            .fetcher(Box::new(FakeFetcher::ok()))
            .sampler(Box::new(FakeSampler::new(5)))
            .model_loader(Box::new(FakeModelLoader::new().failing_at(3)))
            .build()
            .unwrap();

        let err = coordinator.run().await.unwrap_err();

        assert!(matches!(err, AppError::Pose(PoseError::Inference { .. })));
        assert!(!dir.path().join("keypoints.json").exists());
        let saved = ResultJournal::read_entries(&dir.path().join("keypoints.partial.jsonl"))
            .await
            .unwrap();
        let names: Vec<&str> = saved.iter().map(|r| r.frame.as_str()).collect();
        assert_eq!(names, vec!["frame-0001.jpg", "frame-0002.jpg"]);
    }

    #[tokio::test]
    async fn skip_policy_writes_every_other_frame() {
        let dir = tempfile::tempdir().unwrap();
        let configuration = Configuration {
            frame_failure_policy: FrameFailurePolicy::Skip,
            ..configuration(dir.path())
        };
        let mut coordinator = CoordinatorBuilder::new(configuration)
            .fetcher(Box::new(FakeFetcher::ok()))
            .sampler(Box::new(FakeSampler::new(4)))
            .model_loader(Box::new(FakeModelLoader::new().failing_at(2)))
            .build()
            .unwrap();

        let summary = coordinator.run().await.unwrap();

        let names: Vec<String> = read_output(&summary.output)
            .into_iter()
            .map(|r| r.frame)
            .collect();
        assert_eq!(names, vec!["frame-0001.jpg", "frame-0003.jpg", "frame-0004.jpg"]);
        assert_eq!(summary.skipped_frames, vec!["frame-0002.jpg".to_string()]);
    }

    #[test]
    fn build_rejects_missing_capabilities_and_bad_config() {
        let err = CoordinatorBuilder::new(Configuration::default())
            .fetcher(Box::new(FakeFetcher::ok()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Pipeline(_)));

        let err = CoordinatorBuilder::new(Configuration::default())
            .sampling_rate(0.0)
            .fetcher(Box::new(FakeFetcher::ok()))
            .sampler(Box::new(FakeSampler::new(1)))
            .model_loader(Box::new(FakeModelLoader::new()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::Invalid {
                field: "sampling_rate",
                ..
            })
        ));
    }

    #[test]
    fn builder_overrides_configuration() {
        let coordinator = CoordinatorBuilder::new(Configuration::default())
            .video_url("https://example.com/clip.mp4".to_string())
            .work_dir(PathBuf::from("/tmp/poses"))
            .sampling_rate(5.0)
            .model_path(PathBuf::from("model.onnx"))
            .fetcher(Box::new(FakeFetcher::ok()))
            .sampler(Box::new(FakeSampler::new(1)))
            .model_loader(Box::new(FakeModelLoader::new()))
            .build()
            .unwrap();

        let configuration = coordinator.configuration();
        assert_eq!(configuration.video_url, "https://example.com/clip.mp4");
        assert_eq!(configuration.work_dir, PathBuf::from("/tmp/poses"));
        assert_eq!(configuration.sampling_rate, 5.0);
        assert_eq!(configuration.model.path, PathBuf::from("model.onnx"));
    }
}
