//! Stand-ins for the network, ffmpeg and the pose model.

use super::fetcher::Fetcher;
use super::pose::{PoseCandidate, PoseModel, PoseModelLoader};
use super::sampler::{frames_dir, VideoSampler};
use crate::common::FramePath;
use crate::error::{FetchError, ModelError, PoseError, SampleError};
use crate::pipeline::types::{BodyPart, Keypoint};
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn write_frames(dir: &Path, count: u32) -> Vec<FramePath> {
    std::fs::create_dir_all(dir).unwrap();
    (1..=count)
        .map(|index| {
            let frame = FramePath::new(dir, index);
            RgbImage::from_pixel(32, 24, Rgb([90, 120, 150]))
                .save(frame.path())
                .unwrap();
            frame
        })
        .collect()
}

pub struct FakeFetcher {
    status: u16,
    body: Vec<u8>,
}

impl FakeFetcher {
    pub fn ok() -> Self {
        Self {
            status: 200,
            body: b"fake video".to_vec(),
        }
    }

    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<u64, FetchError> {
        if self.status != 200 {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: self.status,
            });
        }
        tokio::fs::write(destination, &self.body)
            .await
            .map_err(|source| FetchError::Io {
                path: destination.to_path_buf(),
                source,
            })?;
        Ok(self.body.len() as u64)
    }

    fn name(&self) -> &'static str {
        "FakeFetcher"
    }
}

/// Writes a fixed number of frames for whatever video it is handed.
pub struct FakeSampler {
    frames: u32,
    videos: Arc<std::sync::Mutex<Vec<PathBuf>>>,
}

impl FakeSampler {
    pub fn new(frames: u32) -> Self {
        Self {
            frames,
            videos: Arc::default(),
        }
    }

    pub fn videos(&self) -> Arc<std::sync::Mutex<Vec<PathBuf>>> {
        self.videos.clone()
    }
}

#[async_trait]
impl VideoSampler for FakeSampler {
    async fn sample(
        &self,
        video: &Path,
        output_dir: &Path,
        _rate: f64,
    ) -> Result<Vec<FramePath>, SampleError> {
        self.videos.lock().unwrap().push(video.to_path_buf());
        write_frames(output_dir, self.frames);
        frames_dir::list_frames(output_dir).await
    }

    fn name(&self) -> &'static str {
        "FakeSampler"
    }
}

/// Puts every landmark at the centre of the frame.
pub struct FakeModel {
    calls: usize,
    fail_at: Option<usize>,
    slow_at: Option<(usize, Duration)>,
}

impl PoseModel for FakeModel {
    fn infer(&mut self, pixels: &RgbImage) -> Result<Vec<PoseCandidate>, ModelError> {
        self.calls += 1;
        if self.fail_at == Some(self.calls) {
            return Err(ModelError::Runtime(format!("inference {} failed", self.calls)));
        }
        if let Some((call, delay)) = self.slow_at {
            if call == self.calls {
                std::thread::sleep(delay);
            }
        }
        let (x, y) = (pixels.width() as f32 / 2.0, pixels.height() as f32 / 2.0);
        let keypoints = BodyPart::ALL
            .iter()
            .map(|part| Keypoint::new(*part, x, y, 0.75))
            .collect();
        Ok(vec![PoseCandidate::new(0.75, keypoints)])
    }

    fn name(&self) -> &'static str {
        "FakeModel"
    }
}

#[derive(Default)]
pub struct FakeModelLoader {
    loads: Arc<AtomicUsize>,
    fail_at: Option<usize>,
    slow_at: Option<(usize, Duration)>,
    unloadable: bool,
}

impl FakeModelLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// The n-th inference (1-based) of each loaded model fails.
    pub fn failing_at(mut self, call: usize) -> Self {
        self.fail_at = Some(call);
        self
    }

    /// The n-th inference (1-based) of each loaded model sleeps for `delay`.
    pub fn slow_at(mut self, call: usize, delay: Duration) -> Self {
        self.slow_at = Some((call, delay));
        self
    }

    pub fn unloadable(mut self) -> Self {
        self.unloadable = true;
        self
    }

    pub fn load_count(&self) -> Arc<AtomicUsize> {
        self.loads.clone()
    }
}

#[async_trait]
impl PoseModelLoader for FakeModelLoader {
    async fn load(&self) -> Result<Box<dyn PoseModel>, PoseError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.unloadable {
            return Err(PoseError::ModelLoad {
                path: PathBuf::from("fake.onnx"),
                message: "unloadable".to_string(),
            });
        }
        Ok(Box::new(FakeModel {
            calls: 0,
            fail_at: self.fail_at,
            slow_at: self.slow_at,
        }))
    }

    fn name(&self) -> &'static str {
        "FakeModelLoader"
    }
}
