//! Staged processing of a single transcript.
//!
//! Segmenting and extracting are required: if either runs out of time on
//! every attempt, or produces nothing, the run fails. Chapters, blogs and
//! social posts run concurrently afterwards; each is optional and degrades
//! to an empty section with a diagnostic instead of failing the run.

mod state;

pub use state::{PipelineRun, PipelineState};

use crate::config::{Prompts, Settings, StageSettings};
use crate::content::ProcessedResult;
use crate::diagnostics::{Diagnostic, Stage, StageOutput};
use crate::error::{RecastError, Result};
use crate::extractor::{Extractor, ExtractorConfig};
use crate::generation::Generator;
use crate::repurposer::{Repurposer, RepurposerConfig};
use crate::segmenter::{Segment, Segmenter, SegmenterConfig};
use crate::synthesizer::{Synthesizer, SynthesizerConfig};
use crate::transcript::{Transcript, VoiceProfile};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Time budget per stage and retries after a timeout.
#[derive(Debug, Clone)]
pub struct StageBudgets {
    pub segmenting: Duration,
    pub extracting: Duration,
    pub chapters: Duration,
    pub blogs: Duration,
    pub social: Duration,
    pub retries: u32,
}

impl StageBudgets {
    pub fn attempts(&self) -> u32 {
        self.retries + 1
    }
}

impl From<&StageSettings> for StageBudgets {
    fn from(stages: &StageSettings) -> Self {
        Self {
            segmenting: stages.segmenting_timeout(),
            extracting: stages.extracting_timeout(),
            chapters: stages.chapters_timeout(),
            blogs: stages.blogs_timeout(),
            social: stages.social_timeout(),
            retries: stages.retries,
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub segmenter: SegmenterConfig,
    pub extractor: ExtractorConfig,
    pub synthesizer: SynthesizerConfig,
    pub repurposer: RepurposerConfig,
    pub budgets: StageBudgets,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl PipelineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            segmenter: settings.segmenter.clone().into(),
            extractor: ExtractorConfig::from_settings(
                &settings.extraction,
                &settings.generation,
                &settings.stages,
            ),
            synthesizer: SynthesizerConfig::from_settings(
                &settings.synthesis,
                &settings.generation,
                &settings.stages,
            ),
            repurposer: RepurposerConfig::from_settings(
                &settings.social,
                &settings.generation,
                &settings.stages,
            ),
            budgets: StageBudgets::from(&settings.stages),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub result: ProcessedResult,
    pub run: PipelineRun,
}

/// Runs transcripts through all stages.
pub struct Pipeline {
    segmenter: Segmenter,
    extractor: Extractor,
    synthesizer: Synthesizer,
    repurposer: Repurposer,
    budgets: StageBudgets,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, generator: Arc<dyn Generator>, prompts: Arc<Prompts>) -> Self {
        Self {
            segmenter: Segmenter::new(config.segmenter),
            extractor: Extractor::new(config.extractor, generator.clone(), prompts.clone()),
            synthesizer: Synthesizer::new(config.synthesizer, generator.clone(), prompts.clone()),
            repurposer: Repurposer::new(config.repurposer, generator, prompts),
            budgets: config.budgets,
        }
    }

    /// Process a transcript. Returns only once a terminal state is reached.
    #[instrument(skip_all, fields(file = %transcript.file_name()))]
    pub async fn run(&self, transcript: &Transcript, cancel: &CancellationToken) -> Result<PipelineOutcome> {
        let mut run = PipelineRun::new();
        match self.execute(transcript, cancel, &mut run).await {
            Ok(result) => {
                run.advance(PipelineState::Completed)?;
                info!(
                    "Completed: {} insights, {} chapters, {} blogs, {} posts ({} diagnostics)",
                    result.insights.len(),
                    result.chapters.len(),
                    result.blogs.len(),
                    result.social.len(),
                    run.diagnostics().len()
                );
                Ok(PipelineOutcome { result, run })
            }
            Err(e) => {
                let stage = run.state();
                run.fail();
                warn!("Processing failed while {}: {}", stage, e);
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        transcript: &Transcript,
        cancel: &CancellationToken,
        run: &mut PipelineRun,
    ) -> Result<ProcessedResult> {
        if transcript.is_blank() {
            return Err(RecastError::EmptyInput);
        }
        let budgets = &self.budgets;
        let attempts = budgets.attempts();

        run.advance(PipelineState::Segmenting)?;
        let text = transcript.text().to_string();
        let segments = with_budget(Stage::Segments, budgets.segmenting, attempts, cancel, || {
            let segmenter = self.segmenter.clone();
            let text = text.clone();
            async move {
                match tokio::task::spawn_blocking(move || segmenter.segment_normalized(&text)).await {
                    Ok(result) => result,
                    Err(e) => Err(RecastError::Pipeline(format!("segmenter task failed: {}", e))),
                }
            }
        })
        .await?;
        if segments.is_empty() {
            return Err(RecastError::StageFailed {
                stage: Stage::Segments.to_string(),
                reason: "no segments produced".to_string(),
            });
        }
        debug!("{} segments", segments.len());

        run.advance(PipelineState::Extracting)?;
        let extraction = with_budget(Stage::Insights, budgets.extracting, attempts, cancel, || {
            self.extractor.extract(&segments, cancel)
        })
        .await?;
        run.extend(extraction.diagnostics);
        let insights = extraction.items;
        if insights.is_empty() {
            return Err(RecastError::StageFailed {
                stage: Stage::Insights.to_string(),
                reason: "no usable insights could be extracted".to_string(),
            });
        }

        run.advance(PipelineState::Generating)?;
        let voice = VoiceProfile::detect(segments.iter().map(Segment::clean_text));
        debug!("Speaker voice: {}", voice.dominant);

        let (chapters, blogs, social) = tokio::join!(
            with_budget(Stage::Chapters, budgets.chapters, attempts, cancel, || {
                self.synthesizer.chapters(&segments, &insights, &voice, cancel)
            }),
            with_budget(Stage::Blogs, budgets.blogs, attempts, cancel, || {
                self.synthesizer.blogs(&segments, &insights, &voice, cancel)
            }),
            with_budget(Stage::Social, budgets.social, attempts, cancel, || {
                self.repurposer.repurpose(&insights, cancel)
            }),
        );

        let chapters = settle(Stage::Chapters, chapters, budgets.chapters, attempts, run)?;
        let blogs = settle(Stage::Blogs, blogs, budgets.blogs, attempts, run)?;
        let social = settle(Stage::Social, social, budgets.social, attempts, run)?;
        if cancel.is_cancelled() {
            return Err(RecastError::Cancelled);
        }

        run.advance(PipelineState::Assembling)?;
        let result = ProcessedResult {
            insights,
            chapters,
            blogs,
            social,
        };
        Ok(assemble(result, segments.len(), run))
    }
}

/// Run a stage under a time budget, retrying after a timeout.
async fn with_budget<T, F, Fut>(
    stage: Stage,
    budget: Duration,
    attempts: u32,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    for n in 1..=attempts.max(1) {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RecastError::Cancelled),
            outcome = tokio::time::timeout(budget, attempt()) => match outcome {
                Ok(result) => return result,
                Err(_) => warn!("{} exceeded {:?} (attempt {} of {})", stage, budget, n, attempts),
            },
        }
    }
    Err(RecastError::StageTimeout {
        stage: stage.to_string(),
    })
}

/// Turn an optional stage's outcome into items, recording what went wrong.
fn settle<T: Default>(
    stage: Stage,
    outcome: Result<StageOutput<T>>,
    budget: Duration,
    attempts: u32,
    run: &mut PipelineRun,
) -> Result<T> {
    match outcome {
        Ok(output) => {
            run.extend(output.diagnostics);
            Ok(output.items)
        }
        Err(RecastError::Cancelled) => Err(RecastError::Cancelled),
        Err(RecastError::StageTimeout { .. }) => {
            run.record(Diagnostic::timeout(stage, budget, attempts));
            Ok(T::default())
        }
        Err(e) => {
            warn!("{} stage failed: {}", stage, e);
            run.record(Diagnostic::partial(stage, format!("stage failed: {}", e)));
            Ok(T::default())
        }
    }
}

/// Drop items that cannot be traced back to at least one existing segment.
fn assemble(mut result: ProcessedResult, segment_count: usize, run: &mut PipelineRun) -> ProcessedResult {
    result.insights.retain_mut(|i| {
        traceable(&mut i.source_segments, segment_count, &i.title, Stage::Insights, run)
    });
    result.chapters.retain_mut(|d| {
        traceable(&mut d.source_segments, segment_count, &d.title, Stage::Chapters, run)
    });
    result.blogs.retain_mut(|d| {
        traceable(&mut d.source_segments, segment_count, &d.title, Stage::Blogs, run)
    });
    result.social.retain_mut(|p| {
        let label = format!("post {}", p.position + 1);
        traceable(&mut p.source_segments, segment_count, &label, Stage::Social, run)
    });
    for (position, post) in result.social.iter_mut().enumerate() {
        post.position = position;
    }
    result
}

fn traceable(
    sources: &mut Vec<usize>,
    segment_count: usize,
    label: &str,
    stage: Stage,
    run: &mut PipelineRun,
) -> bool {
    sources.sort_unstable();
    sources.dedup();
    let ok = !sources.is_empty() && sources.iter().all(|&i| i < segment_count);
    if !ok {
        run.record(Diagnostic::partial(
            Stage::Assembly,
            format!("dropped untraceable {} item '{}'", stage, label),
        ));
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{DerivedDocument, DocumentKind, Insight, InsightKind};
    use crate::diagnostics::DiagnosticKind;
    use crate::generation::{ExtractiveGenerator, GenerationKind, GenerationRequest};
    use async_trait::async_trait;

    const TALK: &str = "I started pricing our product far too low. Customers assumed cheap meant flimsy.\n\n\
        We doubled the pricing overnight. Churn dropped and customers trusted us more.\n\n\
        My advice is simple. Test your pricing early and listen to customers.";

    /// Hangs on one kind of request, echoes the draft otherwise.
    struct Stalls(GenerationKind);

    #[async_trait]
    impl Generator for Stalls {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            if request.kind == self.0 {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok(request.draft.clone())
        }

        fn name(&self) -> &str {
            "stalls"
        }
    }

    /// Only insight refinement succeeds.
    struct InsightsOnly;

    #[async_trait]
    impl Generator for InsightsOnly {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            match request.kind {
                GenerationKind::Insight => Ok(request.draft.clone()),
                kind => Err(RecastError::Generation(format!("no {} today", kind))),
            }
        }

        fn name(&self) -> &str {
            "insights-only"
        }
    }

    fn pipeline(config: PipelineConfig, generator: Arc<dyn Generator>) -> Pipeline {
        Pipeline::new(config, generator, Arc::new(Prompts::default()))
    }

    fn short_budgets(config: &mut PipelineConfig) {
        config.budgets.blogs = Duration::from_millis(50);
        config.budgets.chapters = Duration::from_millis(50);
        config.budgets.extracting = Duration::from_millis(50);
    }

    #[tokio::test]
    async fn test_completes_with_all_sections() {
        let outcome = pipeline(PipelineConfig::default(), Arc::new(ExtractiveGenerator::new()))
            .run(&Transcript::new(TALK, "talk.txt"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.run.state(), PipelineState::Completed);
        assert!(!outcome.result.insights.is_empty());
        assert!(!outcome.result.chapters.is_empty());
        assert!(!outcome.result.blogs.is_empty());
        assert!(!outcome.result.social.is_empty());
        assert!(outcome.result.social.iter().all(|p| p.content.chars().count() <= 280));
        assert_eq!(
            outcome.run.history(),
            &[
                PipelineState::Received,
                PipelineState::Segmenting,
                PipelineState::Extracting,
                PipelineState::Generating,
                PipelineState::Assembling,
                PipelineState::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_transcript_fails() {
        let result = pipeline(PipelineConfig::default(), Arc::new(ExtractiveGenerator::new()))
            .run(&Transcript::new("  \n\n ", "blank.txt"), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(RecastError::EmptyInput)));
    }

    #[tokio::test]
    async fn test_failed_generation_stages_still_complete() {
        let outcome = pipeline(PipelineConfig::default(), Arc::new(InsightsOnly))
            .run(&Transcript::new(TALK, "talk.txt"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.run.state(), PipelineState::Completed);
        assert!(!outcome.result.insights.is_empty());
        assert!(outcome.result.chapters.is_empty());
        assert!(outcome.result.blogs.is_empty());
        assert!(outcome.result.social.is_empty());

        for stage in [Stage::Chapters, Stage::Blogs, Stage::Social] {
            assert!(
                outcome.run.diagnostics().iter().any(|d| d.stage == stage),
                "no diagnostic for {}",
                stage
            );
        }
    }

    #[tokio::test]
    async fn test_blogs_timeout_degrades_gracefully() {
        let mut config = PipelineConfig::default();
        short_budgets(&mut config);
        let outcome = pipeline(config, Arc::new(Stalls(GenerationKind::Blog)))
            .run(&Transcript::new(TALK, "talk.txt"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.run.state(), PipelineState::Completed);
        assert!(outcome.result.blogs.is_empty());
        assert!(!outcome.result.insights.is_empty());
        assert!(!outcome.result.chapters.is_empty());

        let timeouts: Vec<&Diagnostic> = outcome
            .run
            .diagnostics()
            .iter()
            .filter(|d| d.kind == DiagnosticKind::StageTimeout)
            .collect();
        assert_eq!(timeouts.len(), 1);
        assert_eq!(timeouts[0].stage, Stage::Blogs);
    }

    #[tokio::test]
    async fn test_required_stage_timeout_fails() {
        let mut config = PipelineConfig::default();
        short_budgets(&mut config);
        let result = pipeline(config, Arc::new(Stalls(GenerationKind::Insight)))
            .run(&Transcript::new(TALK, "talk.txt"), &CancellationToken::new())
            .await;

        match result {
            Err(RecastError::StageTimeout { stage }) => assert_eq!(stage, "insights"),
            other => panic!("expected insights timeout, got {:?}", other.map(|o| o.run.state())),
        }
    }

    #[tokio::test]
    async fn test_no_insights_fails() {
        let result = pipeline(PipelineConfig::default(), Arc::new(ExtractiveGenerator::new()))
            .run(&Transcript::new("Okay yeah.", "filler.txt"), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(RecastError::StageFailed { ref stage, .. }) if stage == "insights"));
    }

    #[tokio::test]
    async fn test_cancellation_stops_run() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = pipeline(PipelineConfig::default(), Arc::new(Stalls(GenerationKind::Chapter)))
            .run(&Transcript::new(TALK, "talk.txt"), &cancel)
            .await;
        assert!(matches!(result, Err(RecastError::Cancelled)));
    }

    #[test]
    fn test_assemble_drops_untraceable() {
        let mut run = PipelineRun::new();
        let result = ProcessedResult {
            insights: vec![
                Insight {
                    title: "Kept".to_string(),
                    content: "x".to_string(),
                    kind: InsightKind::KeyPoint,
                    source_segments: vec![1, 0, 1],
                    score: 1.0,
                },
                Insight {
                    title: "Orphan".to_string(),
                    content: "y".to_string(),
                    kind: InsightKind::KeyPoint,
                    source_segments: vec![],
                    score: 1.0,
                },
            ],
            chapters: vec![DerivedDocument {
                kind: DocumentKind::Chapter,
                title: "Out of range".to_string(),
                content: "z".to_string(),
                source_segments: vec![7],
            }],
            ..Default::default()
        };

        let result = assemble(result, 2, &mut run);
        assert_eq!(result.insights.len(), 1);
        assert_eq!(result.insights[0].source_segments, vec![0, 1]);
        assert!(result.chapters.is_empty());
        assert_eq!(run.diagnostics().len(), 2);
        assert!(run.diagnostics().iter().all(|d| d.stage == Stage::Assembly));
    }
}
