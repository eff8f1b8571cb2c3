use std::fmt;

use crate::error::AppError;

/// Lifecycle of one pipeline run.
///
/// Runs move forward one stage at a time, `Idle` through `Done`. `Failed` can
/// be entered from any state that is not already terminal; nothing leaves a
/// terminal state, so a failed run has to start over from a fresh context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    Downloading,
    ExtractingFrames,
    DetectingPoses,
    WritingResults,
    Done,
    Failed,
}

impl PipelineState {
    /// Get display name for the state
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Downloading => "Downloading",
            PipelineState::ExtractingFrames => "ExtractingFrames",
            PipelineState::DetectingPoses => "DetectingPoses",
            PipelineState::WritingResults => "WritingResults",
            PipelineState::Done => "Done",
            PipelineState::Failed => "Failed",
        }
    }

    /// Get the execution order priority (lower executes first)
    pub fn priority(&self) -> u8 {
        match self {
            PipelineState::Idle => 0,
            PipelineState::Downloading => 1,
            PipelineState::ExtractingFrames => 2,
            PipelineState::DetectingPoses => 3,
            PipelineState::WritingResults => 4,
            PipelineState::Done => 5,
            PipelineState::Failed => 6,
        }
    }

    pub fn next(&self) -> Option<PipelineState> {
        match self {
            PipelineState::Idle => Some(PipelineState::Downloading),
            PipelineState::Downloading => Some(PipelineState::ExtractingFrames),
            PipelineState::ExtractingFrames => Some(PipelineState::DetectingPoses),
            PipelineState::DetectingPoses => Some(PipelineState::WritingResults),
            PipelineState::WritingResults => Some(PipelineState::Done),
            PipelineState::Done | PipelineState::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    /// States that do work, as opposed to `Idle` and the terminal states.
    pub fn is_stage(&self) -> bool {
        !self.is_terminal() && *self != PipelineState::Idle
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PartialOrd for PipelineState {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PipelineState {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority().cmp(&other.priority())
    }
}

#[derive(Debug, Clone)]
pub struct StateMachine {
    current: PipelineState,
    history: Vec<PipelineState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: PipelineState::Idle,
            history: vec![PipelineState::Idle],
        }
    }

    pub fn current(&self) -> PipelineState {
        self.current
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn transition(&mut self, to: PipelineState) -> Result<(), AppError> {
        let allowed = match to {
            PipelineState::Failed => !self.current.is_terminal(),
            _ => self.current.next() == Some(to),
        };
        if !allowed {
            return Err(AppError::IllegalTransition {
                from: self.current,
                to,
            });
        }
        tracing::debug!("Pipeline state {} -> {}", self.current, to);
        self.current = to;
        self.history.push(to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_the_happy_path() {
        let mut machine = StateMachine::new();
        let mut state = PipelineState::Idle;
        while let Some(next) = state.next() {
            machine.transition(next).unwrap();
            state = next;
        }
        assert_eq!(machine.current(), PipelineState::Done);
        assert_eq!(machine.history().len(), 6);
        assert!(machine.history().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn rejects_skipping_a_stage() {
        let mut machine = StateMachine::new();
        let err = machine.transition(PipelineState::DetectingPoses).unwrap_err();
        assert!(matches!(
            err,
            AppError::IllegalTransition {
                from: PipelineState::Idle,
                to: PipelineState::DetectingPoses
            }
        ));
        assert_eq!(machine.current(), PipelineState::Idle);
    }

    #[test]
    fn failed_is_reachable_from_any_live_state_and_final() {
        for stop in [
            PipelineState::Idle,
            PipelineState::Downloading,
            PipelineState::ExtractingFrames,
            PipelineState::DetectingPoses,
            PipelineState::WritingResults,
        ] {
            let mut machine = StateMachine::new();
            let mut state = PipelineState::Idle;
            while state != stop {
                state = state.next().unwrap();
                machine.transition(state).unwrap();
            }
            machine.transition(PipelineState::Failed).unwrap();
            assert!(machine.transition(PipelineState::Failed).is_err());
            assert!(machine.transition(PipelineState::Downloading).is_err());
        }
    }

    #[test]
    fn done_cannot_fail() {
        let mut machine = StateMachine::new();
        let mut state = PipelineState::Idle;
        while let Some(next) = state.next() {
            machine.transition(next).unwrap();
            state = next;
        }
        assert!(machine.transition(PipelineState::Failed).is_err());
    }
}
