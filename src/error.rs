use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::pipeline::orchestration::pipeline_stage::PipelineState;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Network Error: {0}")]
    Fetch(#[from] FetchError),
    #[error("Transcoding Error: {0}")]
    Sample(#[from] SampleError),
    #[error("Pose Error: {0}")]
    Pose(#[from] PoseError),
    #[error("Output Error: {0}")]
    Output(#[from] OutputError),
    #[error("Illegal pipeline transition from {from} to {to}")]
    IllegalTransition {
        from: PipelineState,
        to: PipelineState,
    },
    #[error("Pipeline Error: {0}")]
    Pipeline(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Download of {url} failed with code {status}")]
    Status { url: String, status: u16 },
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum SampleError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Transcoder exited with {status}: {stderr}")]
    ExitStatus { status: String, stderr: String },
    #[error("Transcoder did not finish within {0:?}")]
    Timeout(Duration),
    #[error("Frame directory error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum PoseError {
    #[error("Failed to load model from {}: {message}", .path.display())]
    ModelLoad { path: PathBuf, message: String },
    #[error("Failed to decode {frame}: {source}")]
    Decode {
        frame: String,
        #[source]
        source: image::ImageError,
    },
    #[error("Inference failed on {frame}: {source}")]
    Inference {
        frame: String,
        #[source]
        source: ModelError,
    },
    #[error("Inference on {frame} did not finish within {after:?}")]
    Timeout { frame: String, after: Duration },
    #[error("Inference task failed: {0}")]
    Task(String),
}

/// Failures raised by a [`PoseModel`](crate::pipeline::services::pose::PoseModel) itself.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("unexpected model output shape {0:?}")]
    OutputShape(Vec<usize>),
    #[error("model returned {found} keypoints, expected {expected}")]
    Schema { expected: usize, found: usize },
    #[error("{0}")]
    Runtime(String),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
