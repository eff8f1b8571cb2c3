use super::model::{PoseCandidate, PoseModel, PoseModelLoader};
use super::movenet::{self, OutputLayout};
use super::tensor::InputTensor;
use crate::config::ModelConfig;
use crate::error::{ModelError, PoseError};
use async_trait::async_trait;
use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use tracing::info;

fn load_error(path: &Path, err: impl std::fmt::Display) -> PoseError {
    PoseError::ModelLoad {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn runtime_error(err: impl std::fmt::Display) -> ModelError {
    ModelError::Runtime(err.to_string())
}

/// MoveNet running on ONNX Runtime.
pub struct OnnxPoseModel {
    session: Session,
    layout: OutputLayout,
    input_width: u32,
    input_height: u32,
    input_name: String,
    output_name: String,
}

impl OnnxPoseModel {
    pub fn from_config(config: &ModelConfig) -> Result<Self, PoseError> {
        let session = Session::builder()
            .map_err(|e| load_error(&config.path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_error(&config.path, e))?
            .commit_from_file(&config.path)
            .map_err(|e| load_error(&config.path, e))?;

        let input_name = match &config.input_name {
            Some(name) => name.clone(),
            None => session
                .inputs
                .first()
                .map(|input| input.name.clone())
                .ok_or_else(|| load_error(&config.path, "model declares no inputs"))?,
        };
        let output_name = match &config.output_name {
            Some(name) => name.clone(),
            None => session
                .outputs
                .first()
                .map(|output| output.name.clone())
                .ok_or_else(|| load_error(&config.path, "model declares no outputs"))?,
        };
        info!(
            "Loaded pose model {} (input '{}', output '{}')",
            config.path.display(),
            input_name,
            output_name
        );

        Ok(Self {
            session,
            layout: config.layout,
            input_width: config.input_width,
            input_height: config.input_height,
            input_name,
            output_name,
        })
    }
}

impl PoseModel for OnnxPoseModel {
    fn infer(&mut self, pixels: &RgbImage) -> Result<Vec<PoseCandidate>, ModelError> {
        // The tensor is moved into the session input and freed when this call returns.
        let input = InputTensor::from_image(pixels, self.input_width, self.input_height);
        let tensor = Tensor::from_array(input.into_array()).map_err(runtime_error)?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(runtime_error)?;
        let output = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()
            .map_err(runtime_error)?;
        movenet::decode_output(self.layout, &output, pixels.width(), pixels.height())
    }

    fn name(&self) -> &'static str {
        "OnnxPoseModel"
    }
}

pub struct OnnxModelLoader {
    config: ModelConfig,
}

impl OnnxModelLoader {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PoseModelLoader for OnnxModelLoader {
    async fn load(&self) -> Result<Box<dyn PoseModel>, PoseError> {
        let config = self.config.clone();
        let model = tokio::task::spawn_blocking(move || OnnxPoseModel::from_config(&config))
            .await
            .map_err(|e| PoseError::Task(e.to_string()))??;
        Ok(Box::new(model))
    }

    fn name(&self) -> &'static str {
        "OnnxModelLoader"
    }
}
