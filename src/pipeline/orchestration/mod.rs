pub mod instrumented_step;
pub mod phase_timings;
pub mod pipeline_stage;
pub mod processing_step;
pub mod run_context;

pub use instrumented_step::{InstrumentedStep, StepInstrumentation};
pub use phase_timings::PhaseTimings;
pub use pipeline_stage::{PipelineState, StateMachine};
pub use processing_step::{ProcessingPipeline, ProcessingStep};
pub use run_context::{RunContext, RunPaths};
