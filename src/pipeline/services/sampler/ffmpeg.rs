use super::frames_dir;
use super::VideoSampler;
use crate::common::frame::FRAME_PATTERN;
use crate::common::FramePath;
use crate::error::SampleError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, instrument};

/// Lines of transcoder stderr kept in an error.
const STDERR_TAIL_LINES: usize = 20;

/// Samples frames by running the `ffmpeg` binary with an `fps` filter.
pub struct FfmpegSampler {
    program: String,
    timeout: Option<Duration>,
}

impl FfmpegSampler {
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn arguments(video: &Path, output_dir: &Path, rate: f64) -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-i".into(),
            video.as_os_str().to_os_string(),
            "-vf".into(),
            format!("fps={rate}").into(),
            output_dir.join(FRAME_PATTERN).into_os_string(),
        ]
    }

    fn command_line(&self, arguments: &[OsString]) -> String {
        std::iter::once(self.program.clone())
            .chain(arguments.iter().map(|arg| arg.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[async_trait]
impl VideoSampler for FfmpegSampler {
    #[instrument(skip(self, video, output_dir), fields(video = %video.display()))]
    async fn sample(
        &self,
        video: &Path,
        output_dir: &Path,
        rate: f64,
    ) -> Result<Vec<FramePath>, SampleError> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| SampleError::Io {
                path: output_dir.to_path_buf(),
                source,
            })?;

        let arguments = Self::arguments(video, output_dir, rate);
        let child = Command::new(&self.program)
            .args(&arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SampleError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        info!("Started FFmpeg: {}", self.command_line(&arguments));

        let waiting = child.wait_with_output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, waiting)
                .await
                .map_err(|_| SampleError::Timeout(limit))?,
            None => waiting.await,
        }
        .map_err(|source| SampleError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(SampleError::ExitStatus {
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        let frames = frames_dir::list_frames(output_dir).await?;
        info!("Frames extracted: {}", frames.len());
        Ok(frames)
    }

    fn name(&self) -> &'static str {
        "FfmpegSampler"
    }
}
