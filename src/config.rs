use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::pipeline::services::pose::{FrameFailurePolicy, InferenceOptions, OutputLayout};
use crate::pipeline::services::sampler::FramesDirPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "pose-pipeline";
pub const ENV_PREFIX: &str = "POSE";
const DEFAULT_VIDEO_EXTENSION: &str = "mp4";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub video_url: String,
    pub work_dir: PathBuf,
    /// Overrides the `video.<ext>` name derived from the URL.
    pub video_file: Option<String>,
    pub frames_dir: String,
    pub output_file: String,
    pub journal_file: String,
    /// Frames sampled per second of video.
    pub sampling_rate: f64,
    pub frames_dir_policy: FramesDirPolicy,
    pub frame_failure_policy: FrameFailurePolicy,
    pub ffmpeg_path: String,
    pub model: ModelConfig,
    pub inference: InferenceOptions,
    pub fetch_timeout_secs: Option<u64>,
    pub transcode_timeout_secs: Option<u64>,
    pub inference_timeout_secs: Option<u64>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            video_url: "https://thravos.nyc3.digitaloceanspaces.com/feed/fb87d5b0-00d6-11f0-8796-b313b7f9e6d0-tony%20movie.mov".to_string(),
            work_dir: PathBuf::from("."),
            video_file: None,
            frames_dir: "frames".to_string(),
            output_file: "keypoints.json".to_string(),
            journal_file: "keypoints.partial.jsonl".to_string(),
            sampling_rate: 10.0,
            frames_dir_policy: FramesDirPolicy::default(),
            frame_failure_policy: FrameFailurePolicy::default(),
            ffmpeg_path: "ffmpeg".to_string(),
            model: ModelConfig::default(),
            inference: InferenceOptions::default(),
            fetch_timeout_secs: None,
            transcode_timeout_secs: None,
            inference_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub layout: OutputLayout,
    pub input_width: u32,
    pub input_height: u32,
    /// Defaults to the session's first input.
    pub input_name: Option<String>,
    /// Defaults to the session's first output.
    pub output_name: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/movenet_singlepose_lightning.onnx"),
            layout: OutputLayout::SinglePose,
            input_width: 192,
            input_height: 192,
            input_name: None,
            output_name: None,
        }
    }
}

impl Configuration {
    /// Layers defaults, an optional TOML file and `POSE_*` environment variables.
    ///
    /// Without an explicit path, `pose-pipeline.toml` in the current directory is
    /// read when present. Nested keys use a double underscore, e.g.
    /// `POSE_MODEL__PATH`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let configuration: Configuration = settings.try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.video_url).map_err(|e| ConfigError::Invalid {
            field: "video_url",
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                field: "video_url",
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if !self.sampling_rate.is_finite() || self.sampling_rate <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "sampling_rate",
                reason: format!("must be a positive number, got {}", self.sampling_rate),
            });
        }
        for (field, value) in [
            ("frames_dir", &self.frames_dir),
            ("output_file", &self.output_file),
            ("journal_file", &self.journal_file),
            ("ffmpeg_path", &self.ffmpeg_path),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must not be empty".to_string(),
                });
            }
        }
        if self.output_file == self.journal_file {
            return Err(ConfigError::Invalid {
                field: "journal_file",
                reason: "must differ from output_file".to_string(),
            });
        }
        if self.model.input_width == 0 || self.model.input_height == 0 {
            return Err(ConfigError::Invalid {
                field: "model",
                reason: "input dimensions must be non-zero".to_string(),
            });
        }
        if self.inference.max_detections == 0 {
            return Err(ConfigError::Invalid {
                field: "inference.max_detections",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.inference.score_threshold) {
            return Err(ConfigError::Invalid {
                field: "inference.score_threshold",
                reason: format!("must lie in [0, 1], got {}", self.inference.score_threshold),
            });
        }
        Ok(())
    }

    /// `video.<ext>`, with the extension taken from the last URL path segment.
    pub fn video_file_name(&self) -> String {
        if let Some(name) = &self.video_file {
            return name.clone();
        }
        let extension = reqwest::Url::parse(&self.video_url)
            .ok()
            .and_then(|url| {
                url.path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_string))
            })
            .and_then(|segment| {
                Path::new(&segment)
                    .extension()
                    .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            })
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| DEFAULT_VIDEO_EXTENSION.to_string());
        format!("video.{extension}")
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }

    pub fn transcode_timeout(&self) -> Option<Duration> {
        self.transcode_timeout_secs.map(Duration::from_secs)
    }

    pub fn inference_timeout(&self) -> Option<Duration> {
        self.inference_timeout_secs.map(Duration::from_secs)
    }
}
