use crate::common::FramePath;
use crate::config::Configuration;
use crate::error::AppError;
use crate::pipeline::orchestration::phase_timings::PhaseTimings;
use crate::pipeline::orchestration::pipeline_stage::{PipelineState, StateMachine};
use crate::pipeline::services::sampler::frames_dir;
use crate::pipeline::types::PoseResult;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

/// Filesystem hand-off points of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub video: PathBuf,
    pub frames_dir: PathBuf,
    pub output: PathBuf,
    pub journal: PathBuf,
}

impl RunPaths {
    pub fn resolve(configuration: &Configuration, run_id: Uuid) -> Self {
        let work_dir = &configuration.work_dir;
        Self {
            video: work_dir.join(configuration.video_file_name()),
            frames_dir: frames_dir::resolve(
                &work_dir.join(&configuration.frames_dir),
                configuration.frames_dir_policy,
                run_id,
            ),
            output: work_dir.join(&configuration.output_file),
            journal: work_dir.join(&configuration.journal_file),
        }
    }
}

/// Context object that flows through the processing pipeline
/// Contains all the state needed for a single run
pub struct RunContext {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub video_url: String,
    pub paths: RunPaths,
    pub bytes_downloaded: u64,
    pub frames: Vec<FramePath>,
    pub results: Vec<PoseResult>,
    pub skipped_frames: Vec<String>,
    pub phase_timings: PhaseTimings,
    pub processing_start: Instant,
    state: StateMachine,
}

impl RunContext {
    pub fn new(configuration: &Configuration) -> Self {
        let run_id = Uuid::new_v4();
        Self {
            run_id,
            started_at: Utc::now(),
            video_url: configuration.video_url.clone(),
            paths: RunPaths::resolve(configuration, run_id),
            bytes_downloaded: 0,
            frames: Vec::new(),
            results: Vec::new(),
            skipped_frames: Vec::new(),
            phase_timings: PhaseTimings::new(),
            processing_start: Instant::now(),
            state: StateMachine::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state.current()
    }

    pub fn history(&self) -> &[PipelineState] {
        self.state.history()
    }

    pub fn advance(&mut self, to: PipelineState) -> Result<(), AppError> {
        self.state.transition(to)
    }

    pub fn fail(&mut self) -> Result<(), AppError> {
        self.advance(PipelineState::Failed)
    }
}
