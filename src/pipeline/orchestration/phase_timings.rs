use crate::pipeline::orchestration::pipeline_stage::PipelineState;
use indexmap::IndexMap;
use std::time::Duration;

/// Wall-clock time spent in each pipeline stage, in execution order.
#[derive(Debug, Clone, Default)]
pub struct PhaseTimings {
    stage_durations: IndexMap<PipelineState, Duration>,
}

impl PhaseTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stage: PipelineState, duration: Duration) {
        *self.stage_durations.entry(stage).or_default() += duration;
    }

    /// Get all stage durations
    pub fn get_all_stage_durations(&self) -> &IndexMap<PipelineState, Duration> {
        &self.stage_durations
    }
}
