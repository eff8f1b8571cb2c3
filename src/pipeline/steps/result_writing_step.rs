use crate::error::AppError;
use crate::pipeline::orchestration::{PipelineState, ProcessingStep, RunContext};
use crate::pipeline::services::output::journal;
use crate::pipeline::services::ResultWriter;
use async_trait::async_trait;
use tracing::debug;

/// Writes the result set, then drops the checkpoint journal it supersedes.
pub struct ResultWritingStep;

#[async_trait]
impl ProcessingStep for ResultWritingStep {
    async fn process(&mut self, context: &mut RunContext) -> Result<(), AppError> {
        ResultWriter::new(&context.paths.output)
            .write(&context.results)
            .await?;
        journal::remove(&context.paths.journal).await?;
        debug!("Removed checkpoint journal {}", context.paths.journal.display());
        Ok(())
    }

    fn stage(&self) -> PipelineState {
        PipelineState::WritingResults
    }

    fn name(&self) -> &'static str {
        "ResultWritingStep"
    }
}
