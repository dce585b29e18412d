//! Long-form synthesis: book chapters and blog posts.
//!
//! Drafts are assembled from literal transcript sentences, then passed through
//! the generator with the speaker's voice profile. A document whose generation
//! fails is left out; producing fewer documents than requested is reported,
//! never padded.

mod blogs;
mod chapters;

use crate::config::{GenerationSettings, Prompts, StageSettings, SynthesisSettings};
use crate::content::{DerivedDocument, DocumentKind, Insight};
use crate::diagnostics::{Diagnostic, Stage, StageOutput};
use crate::error::{RecastError, Result};
use crate::generation::{generate_all, GenerationKind, GenerationRequest, Generator};
use crate::segmenter::Segment;
use crate::transcript::VoiceProfile;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Synthesizer configuration.
#[derive(Debug, Clone)]
pub struct SynthesizerConfig {
    pub chapter_count: usize,
    pub chapter_target_chars: usize,
    pub blog_count: usize,
    pub blog_target_chars: usize,
    pub creativity: f32,
    pub generation_retries: u32,
    pub max_concurrent: usize,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self::from_settings(
            &SynthesisSettings::default(),
            &GenerationSettings::default(),
            &StageSettings::default(),
        )
    }
}

impl SynthesizerConfig {
    pub fn from_settings(
        synthesis: &SynthesisSettings,
        generation: &GenerationSettings,
        stages: &StageSettings,
    ) -> Self {
        Self {
            chapter_count: synthesis.chapter_count,
            chapter_target_chars: synthesis.chapter_target_chars.max(1),
            blog_count: synthesis.blog_count,
            blog_target_chars: synthesis.blog_target_chars.max(1),
            creativity: synthesis.creativity,
            generation_retries: stages.generation_retries,
            max_concurrent: generation.max_concurrent,
        }
    }
}

/// A document before generation.
#[derive(Debug, Clone, PartialEq)]
struct DocumentPlan {
    title: String,
    draft: String,
    source_segments: Vec<usize>,
}

/// Writes chapters and blog posts.
pub struct Synthesizer {
    config: SynthesizerConfig,
    generator: Arc<dyn Generator>,
    prompts: Arc<Prompts>,
}

impl Synthesizer {
    pub fn new(config: SynthesizerConfig, generator: Arc<dyn Generator>, prompts: Arc<Prompts>) -> Self {
        Self {
            config,
            generator,
            prompts,
        }
    }

    /// Book chapters over contiguous, length-balanced runs of segments.
    #[instrument(skip_all, fields(segments = segments.len()))]
    pub async fn chapters(
        &self,
        segments: &[Segment],
        insights: &[Insight],
        voice: &VoiceProfile,
        cancel: &CancellationToken,
    ) -> Result<StageOutput<Vec<DerivedDocument>>> {
        let plans = chapters::plan(
            segments,
            insights,
            self.config.chapter_count,
            self.config.chapter_target_chars,
        );
        self.realize(DocumentKind::Chapter, plans, self.config.chapter_count, voice, cancel)
            .await
    }

    /// Blog posts, each built around a group of insights.
    #[instrument(skip_all, fields(insights = insights.len()))]
    pub async fn blogs(
        &self,
        segments: &[Segment],
        insights: &[Insight],
        voice: &VoiceProfile,
        cancel: &CancellationToken,
    ) -> Result<StageOutput<Vec<DerivedDocument>>> {
        let plans = blogs::plan(
            segments,
            insights,
            self.config.blog_count,
            self.config.blog_target_chars,
        );
        self.realize(DocumentKind::Blog, plans, self.config.blog_count, voice, cancel)
            .await
    }

    async fn realize(
        &self,
        kind: DocumentKind,
        plans: Vec<DocumentPlan>,
        requested: usize,
        voice: &VoiceProfile,
        cancel: &CancellationToken,
    ) -> Result<StageOutput<Vec<DerivedDocument>>> {
        if cancel.is_cancelled() {
            return Err(RecastError::Cancelled);
        }

        let (stage, label, generation_kind, prompts, target_chars) = match kind {
            DocumentKind::Chapter => (
                Stage::Chapters,
                "chapters",
                GenerationKind::Chapter,
                &self.prompts.chapters,
                self.config.chapter_target_chars,
            ),
            DocumentKind::Blog => (
                Stage::Blogs,
                "blog posts",
                GenerationKind::Blog,
                &self.prompts.blogs,
                self.config.blog_target_chars,
            ),
        };

        let requests: Vec<GenerationRequest> = plans
            .iter()
            .map(|plan| {
                let mut vars = HashMap::new();
                vars.insert("title".to_string(), plan.title.clone());
                vars.insert("voice".to_string(), voice.dominant.to_string());
                vars.insert("phrases".to_string(), voice.phrases_for_prompt());
                vars.insert("target_chars".to_string(), target_chars.to_string());
                vars.insert("draft".to_string(), plan.draft.clone());

                GenerationRequest::new(generation_kind, plan.draft.clone())
                    .with_prompts(
                        prompts.system.clone(),
                        self.prompts.render_with_custom(&prompts.user, &vars),
                    )
                    .with_temperature(self.config.creativity)
            })
            .collect();

        let outputs = generate_all(
            self.generator.as_ref(),
            &requests,
            self.config.generation_retries,
            self.config.max_concurrent,
            cancel,
        )
        .await?;

        let mut documents = Vec::with_capacity(plans.len());
        let mut diagnostics = Vec::new();
        for (plan, output) in plans.into_iter().zip(outputs) {
            match output {
                Ok(content) => documents.push(DerivedDocument {
                    kind,
                    title: plan.title,
                    content,
                    source_segments: plan.source_segments,
                }),
                Err(e) => diagnostics.push(Diagnostic::partial(
                    stage,
                    format!("omitted '{}': {}", plan.title, e),
                )),
            }
        }

        if documents.len() < requested {
            diagnostics.push(Diagnostic::partial(
                stage,
                format!("produced {} of {} requested {}", documents.len(), requested, label),
            ));
        }

        info!("Synthesized {} {}", documents.len(), label);
        Ok(StageOutput::new(documents, diagnostics))
    }
}

/// Split items into at most `count` contiguous, non-empty groups of similar weight.
fn contiguous_groups<T>(items: &[T], count: usize, weight: impl Fn(&T) -> usize) -> Vec<&[T]> {
    let count = count.min(items.len());
    if count == 0 {
        return Vec::new();
    }

    let total: usize = items.iter().map(|item| weight(item).max(1)).sum();
    let mut groups = Vec::with_capacity(count);
    let mut start = 0;
    let mut acc = 0;

    for (i, item) in items.iter().enumerate() {
        if groups.len() + 1 == count {
            break;
        }
        acc += weight(item).max(1);
        let groups_after = count - groups.len() - 1;
        let items_after = items.len() - i - 1;
        let threshold = total * (groups.len() + 1) / count;
        if acc >= threshold || items_after == groups_after {
            groups.push(&items[start..=i]);
            start = i + 1;
        }
    }

    groups.push(&items[start..]);
    groups
}

/// Append sentences while the text stays within `budget` characters.
/// The first sentence is always taken so a draft is never empty.
fn fill_sentences<'a>(out: &mut Vec<&'a str>, used: &mut usize, sentences: &[&'a str], budget: usize) -> bool {
    for sentence in sentences {
        let len = sentence.chars().count() + 1;
        if *used > 0 && *used + len > budget {
            return false;
        }
        out.push(sentence);
        *used += len;
    }
    true
}

/// Highest scoring insight drawn from any of `sources`; earliest wins ties.
fn lead_insight<'a>(insights: &'a [Insight], sources: &[usize]) -> Option<&'a Insight> {
    insights
        .iter()
        .filter(|i| i.source_segments.iter().any(|s| sources.contains(s)))
        .fold(None, |best: Option<&Insight>, candidate| match best {
            Some(b) if b.score >= candidate.score => Some(b),
            _ => Some(candidate),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::split_sentences;
    use crate::extractor::{Extractor, ExtractorConfig};
    use crate::generation::ExtractiveGenerator;
    use crate::segmenter::Segmenter;
    use crate::transcript::Transcript;
    use async_trait::async_trait;

    const TALK: &str = "I started pricing our product far too low. Customers assumed cheap meant flimsy.\n\n\
        We doubled the pricing overnight. Churn dropped and customers trusted us more.\n\n\
        Hiring was the next bottleneck. I hired slowly and paid engineers well.\n\n\
        My advice is simple. Test your pricing early and listen to customers.";

    async fn fixture() -> (Vec<Segment>, Vec<Insight>, VoiceProfile) {
        let segments = Segmenter::default()
            .segment(&Transcript::new(TALK, "talk.txt"))
            .unwrap();
        let insights = Extractor::new(
            ExtractorConfig::default(),
            Arc::new(ExtractiveGenerator::new()),
            Arc::new(Prompts::default()),
        )
        .extract(&segments, &CancellationToken::new())
        .await
        .unwrap()
        .items;
        let voice = VoiceProfile::detect(segments.iter().map(Segment::clean_text));
        (segments, insights, voice)
    }

    fn synthesizer(config: SynthesizerConfig, generator: Arc<dyn Generator>) -> Synthesizer {
        Synthesizer::new(config, generator, Arc::new(Prompts::default()))
    }

    struct RefusesBlogs;

    #[async_trait]
    impl Generator for RefusesBlogs {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            match request.kind {
                GenerationKind::Blog => Err(RecastError::Generation("refused".to_string())),
                _ => Ok(request.draft.clone()),
            }
        }

        fn name(&self) -> &str {
            "refuses-blogs"
        }
    }

    #[test]
    fn test_contiguous_groups() {
        let items = [5, 5, 5, 5, 5, 5];
        let groups = contiguous_groups(&items, 3, |w| *w);
        assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), vec![2, 2, 2]);

        let uneven = [100, 1, 1, 1];
        let groups = contiguous_groups(&uneven, 3, |w| *w);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| !g.is_empty()));
        assert_eq!(groups.iter().map(|g| g.len()).sum::<usize>(), 4);

        assert_eq!(contiguous_groups(&items, 10, |w| *w).len(), 6);
        assert!(contiguous_groups(&items, 0, |w| *w).is_empty());
    }

    #[tokio::test]
    async fn test_chapters_are_ordered_and_literal() {
        let (segments, insights, voice) = fixture().await;
        let config = SynthesizerConfig {
            chapter_count: 2,
            ..SynthesizerConfig::default()
        };
        let out = synthesizer(config, Arc::new(ExtractiveGenerator::new()))
            .chapters(&segments, &insights, &voice, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(out.items.len(), 2);
        assert!(out.diagnostics.is_empty());
        assert!(out.items[0].title.starts_with("Chapter 1: "));
        assert!(out.items[1].title.starts_with("Chapter 2: "));
        assert!(out.items[0].source_segments.last() < out.items[1].source_segments.first());
        for chapter in &out.items {
            for sentence in split_sentences(&chapter.content) {
                assert!(TALK.contains(sentence));
            }
        }
    }

    #[tokio::test]
    async fn test_chapter_shortfall_reported() {
        let (segments, insights, voice) = fixture().await;
        let config = SynthesizerConfig {
            chapter_count: 10,
            ..SynthesizerConfig::default()
        };
        let out = synthesizer(config, Arc::new(ExtractiveGenerator::new()))
            .chapters(&segments, &insights, &voice, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(out.items.len(), segments.len());
        assert_eq!(out.diagnostics.len(), 1);
        assert!(out.diagnostics[0].message.contains("of 10 requested chapters"));
    }

    #[tokio::test]
    async fn test_blogs_use_insights() {
        let (segments, insights, voice) = fixture().await;
        let out = synthesizer(SynthesizerConfig::default(), Arc::new(ExtractiveGenerator::new()))
            .blogs(&segments, &insights, &voice, &CancellationToken::new())
            .await
            .unwrap();

        assert!(!out.items.is_empty());
        assert!(out.items.len() <= 3);
        for blog in &out.items {
            assert_eq!(blog.kind, DocumentKind::Blog);
            assert!(insights.iter().any(|i| i.title == blog.title));
            assert!(!blog.source_segments.is_empty());
        }
    }

    #[tokio::test]
    async fn test_failed_documents_are_omitted() {
        let (segments, insights, voice) = fixture().await;
        let out = synthesizer(SynthesizerConfig::default(), Arc::new(RefusesBlogs))
            .blogs(&segments, &insights, &voice, &CancellationToken::new())
            .await
            .unwrap();

        assert!(out.items.is_empty());
        assert!(out.diagnostics.iter().any(|d| d.message.contains("refused")));
        assert!(out.diagnostics.iter().all(|d| d.stage == Stage::Blogs));
    }
}
