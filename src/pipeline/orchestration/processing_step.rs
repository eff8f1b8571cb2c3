use super::pipeline_stage::PipelineState;
use super::run_context::RunContext;
use crate::error::AppError;
use async_trait::async_trait;

/// Chain of Responsibility pattern for processing pipeline
#[async_trait]
pub trait ProcessingStep: Send + Sync {
    async fn process(&mut self, context: &mut RunContext) -> Result<(), AppError>;
    /// The state the run is in while this step executes.
    fn stage(&self) -> PipelineState;
    fn name(&self) -> &'static str;
}

/// Runs its steps strictly in sequence, driving the run's state machine.
pub struct ProcessingPipeline {
    steps: Vec<Box<dyn ProcessingStep>>,
}

impl Default for ProcessingPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingPipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn add_step(mut self, step: Box<dyn ProcessingStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// On the first error the run is marked `Failed` and the error is returned
    /// unchanged. No step is retried.
    pub async fn process(&mut self, context: &mut RunContext) -> Result<(), AppError> {
        for step in &mut self.steps {
            tracing::debug!("Processing step: {}", step.name());
            let outcome = match context.advance(step.stage()) {
                Ok(()) => step.process(context).await,
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                let failed_in = context.state();
                if context.fail().is_ok() {
                    tracing::error!("Pipeline failed during {}: {}", failed_in, e);
                    tracing::debug!("States visited: {:?}", context.history());
                }
                return Err(e);
            }
        }
        context.advance(PipelineState::Done)
    }
}
