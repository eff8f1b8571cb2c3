use super::model::{InferenceOptions, PoseModel};
use crate::common::FramePath;
use crate::error::PoseError;
use crate::pipeline::types::PoseResult;
use futures::Future;
use futures::task::{Context, Poll};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower::util::BoxService;
use tower::{BoxError, Service};
use tracing::warn;

/// Decodes one frame and runs the model on it.
///
/// The decoded pixels (and the model's input tensor inside `infer`) are scoped
/// to this call and dropped on every exit path.
pub fn estimate_frame(
    model: &mut dyn PoseModel,
    frame: &FramePath,
    options: &InferenceOptions,
) -> Result<PoseResult, PoseError> {
    let pixels = image::open(frame.path())
        .map_err(|source| PoseError::Decode {
            frame: frame.file_name().to_string(),
            source,
        })?
        .to_rgb8();
    let keypoints = model
        .estimate_single_pose(&pixels, options)
        .map_err(|source| PoseError::Inference {
            frame: frame.file_name().to_string(),
            source,
        })?;
    Ok(PoseResult::new(frame.file_name(), keypoints))
}

/// Tower service turning a [`FramePath`] into a [`PoseResult`].
///
/// Inference runs on the blocking pool and owns the model lock for as long as
/// it runs. The optional timeout starts once the lock is held, so a frame that
/// overruns is reported as timed out while the next frame waits for the model
/// and then gets its full budget.
#[derive(Clone)]
pub struct PoseFrameService {
    model: Arc<Mutex<Box<dyn PoseModel>>>,
    options: InferenceOptions,
    timeout: Option<Duration>,
}

impl PoseFrameService {
    pub fn new(model: Box<dyn PoseModel>, options: InferenceOptions) -> Self {
        Self {
            model: Arc::new(Mutex::new(model)),
            options,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn boxed(self) -> BoxService<FramePath, PoseResult, BoxError> {
        BoxService::new(self)
    }
}

impl Service<FramePath> for PoseFrameService {
    type Response = PoseResult;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, frame: FramePath) -> Self::Future {
        let model = self.model.clone();
        let options = self.options;
        let timeout = self.timeout;

        Box::pin(async move {
            let mut model = model.lock_owned().await;
            let name = frame.file_name().to_string();
            let handle = tokio::task::spawn_blocking(move || {
                estimate_frame(&mut **model, &frame, &options)
            });
            let joined = match timeout {
                Some(limit) => match tokio::time::timeout(limit, handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        // The blocking task keeps the model lock until it returns.
                        warn!("Inference on {} still running after {:?}", name, limit);
                        return Err(PoseError::Timeout {
                            frame: name,
                            after: limit,
                        }
                        .into());
                    }
                },
                None => handle.await,
            };
            let result = joined.map_err(|e| PoseError::Task(e.to_string()))??;
            Ok::<_, BoxError>(result)
        })
    }
}

/// Recovers the typed error from a boxed service error.
pub fn into_pose_error(err: BoxError) -> PoseError {
    match err.downcast::<PoseError>() {
        Ok(pose) => *pose,
        Err(err) => PoseError::Task(err.to_string()),
    }
}
