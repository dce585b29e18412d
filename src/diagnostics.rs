//! Non-fatal problems recorded while processing a transcript.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pipeline stage names, as they appear in diagnostics and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Segments,
    Insights,
    Chapters,
    Blogs,
    Social,
    Assembly,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Segments => "segments",
            Stage::Insights => "insights",
            Stage::Chapters => "chapters",
            Stage::Blogs => "blogs",
            Stage::Social => "social",
            Stage::Assembly => "assembly",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The stage exceeded its time budget on every attempt.
    StageTimeout,
    /// Some content could not be produced and was left out.
    PartialContent,
}

/// A recorded, non-fatal problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<usize>,
}

impl Diagnostic {
    /// Stage ran out of time on every attempt.
    pub fn timeout(stage: Stage, budget: Duration, attempts: u32) -> Self {
        Self {
            stage,
            kind: DiagnosticKind::StageTimeout,
            message: format!(
                "{} did not finish within {:?} ({} attempt{})",
                stage,
                budget,
                attempts,
                if attempts == 1 { "" } else { "s" }
            ),
            segment: None,
        }
    }

    /// Content left out of a section.
    pub fn partial(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind: DiagnosticKind::PartialContent,
            message: message.into(),
            segment: None,
        }
    }

    /// Attach the segment the problem relates to.
    pub fn for_segment(mut self, index: usize) -> Self {
        self.segment = Some(index);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.segment {
            Some(segment) => write!(f, "[{}] segment {}: {}", self.stage, segment, self.message),
            None => write!(f, "[{}] {}", self.stage, self.message),
        }
    }
}

/// Items produced by a stage plus what it had to leave out.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutput<T> {
    pub items: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> StageOutput<T> {
    pub fn new(items: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { items, diagnostics }
    }
}
