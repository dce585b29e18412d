//! Processing lifecycle.

use crate::diagnostics::Diagnostic;
use crate::error::{RecastError, Result};
use serde::{Deserialize, Serialize};

/// Lifecycle of one processing run. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Received,
    Segmenting,
    Extracting,
    Generating,
    Assembling,
    Completed,
    Failed,
}

impl PipelineState {
    fn rank(&self) -> u8 {
        match self {
            PipelineState::Received => 0,
            PipelineState::Segmenting => 1,
            PipelineState::Extracting => 2,
            PipelineState::Generating => 3,
            PipelineState::Assembling => 4,
            PipelineState::Completed => 5,
            PipelineState::Failed => 6,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Failed)
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineState::Received => "received",
            PipelineState::Segmenting => "segmenting",
            PipelineState::Extracting => "extracting",
            PipelineState::Generating => "generating",
            PipelineState::Assembling => "assembling",
            PipelineState::Completed => "completed",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// State and diagnostics of a run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    state: PipelineState,
    history: Vec<PipelineState>,
    diagnostics: Vec<Diagnostic>,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Received,
            history: vec![PipelineState::Received],
            diagnostics: Vec::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every state visited, in order.
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    /// Move to a later state. Terminal states are final.
    pub fn advance(&mut self, next: PipelineState) -> Result<()> {
        if self.state.is_terminal() || next.rank() <= self.state.rank() {
            return Err(RecastError::Pipeline(format!(
                "invalid transition {} -> {}",
                self.state, next
            )));
        }
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Mark the run failed. No effect once terminal.
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = PipelineState::Failed;
            self.history.push(PipelineState::Failed);
        }
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only() {
        let mut run = PipelineRun::new();
        run.advance(PipelineState::Segmenting).unwrap();
        run.advance(PipelineState::Extracting).unwrap();
        assert!(run.advance(PipelineState::Segmenting).is_err());
        assert!(run.advance(PipelineState::Extracting).is_err());
        run.advance(PipelineState::Generating).unwrap();
        run.advance(PipelineState::Assembling).unwrap();
        run.advance(PipelineState::Completed).unwrap();
        assert!(run.advance(PipelineState::Failed).is_err());
        assert_eq!(run.history().len(), 6);
    }

    #[test]
    fn test_fail_is_terminal() {
        let mut run = PipelineRun::new();
        run.advance(PipelineState::Segmenting).unwrap();
        run.fail();
        assert_eq!(run.state(), PipelineState::Failed);
        assert!(run.advance(PipelineState::Completed).is_err());
        run.fail();
        assert_eq!(run.history(), &[PipelineState::Received, PipelineState::Segmenting, PipelineState::Failed]);
    }
}
