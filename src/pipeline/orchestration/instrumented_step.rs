use super::pipeline_stage::PipelineState;
use super::processing_step::ProcessingStep;
use super::run_context::RunContext;
use crate::error::AppError;
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Runs a step inside its own span and charges its wall-clock time to the
/// step's stage in the run's [`PhaseTimings`](super::PhaseTimings), whether
/// or not the step succeeds.
pub struct InstrumentedStep<S> {
    inner: S,
    label: String,
}

impl<S> InstrumentedStep<S> {
    pub fn new(step: S, label: impl Into<String>) -> Self {
        Self {
            inner: step,
            label: label.into(),
        }
    }
}

#[async_trait]
impl<S> ProcessingStep for InstrumentedStep<S>
where
    S: ProcessingStep,
{
    #[instrument(skip(self, context), fields(step = %self.label, run_id = %context.run_id))]
    async fn process(&mut self, context: &mut RunContext) -> Result<(), AppError> {
        let stage = self.inner.stage();
        let start = Instant::now();

        let result = self.inner.process(context).await;

        let elapsed = start.elapsed();
        if stage.is_stage() {
            context.phase_timings.record(stage, elapsed);
        }
        match &result {
            Ok(()) => info!("{} finished in {:.2?}", stage, elapsed),
            Err(_) => debug!("{} stopped after {:.2?}", stage, elapsed),
        }
        result
    }

    fn stage(&self) -> PipelineState {
        self.inner.stage()
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

pub trait StepInstrumentation: Sized {
    fn instrumented(self, label: impl Into<String>) -> InstrumentedStep<Self>;
}

impl<S> StepInstrumentation for S
where
    S: ProcessingStep,
{
    fn instrumented(self, label: impl Into<String>) -> InstrumentedStep<Self> {
        InstrumentedStep::new(self, label)
    }
}
