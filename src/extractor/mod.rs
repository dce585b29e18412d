//! Insight extraction.
//!
//! Each intelligible segment yields a key-point insight quoted from its best
//! sentences; terms recurring across segments yield theme insights. Insights
//! with the same normalized title are merged, and the list is capped by score
//! while keeping transcript order.

use crate::analysis::{best_sentences, content_words, split_sentences, title_case, KeywordIndex};
use crate::config::{ExtractionSettings, GenerationSettings, Prompts, StageSettings};
use crate::content::{Insight, InsightKind};
use crate::diagnostics::{Diagnostic, Stage, StageOutput};
use crate::error::{RecastError, Result};
use crate::generation::{generate_all, GenerationKind, GenerationRequest, Generator};
use crate::segmenter::Segment;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Maximum characters of source text sent along with an insight.
const MAX_SOURCE_CHARS: usize = 4000;

/// Extractor configuration.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub max_insights: usize,
    pub sentences_per_insight: usize,
    pub min_content_words: usize,
    pub max_themes: usize,
    pub creativity: f32,
    pub generation_retries: u32,
    pub max_concurrent: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::from_settings(
            &ExtractionSettings::default(),
            &GenerationSettings::default(),
            &StageSettings::default(),
        )
    }
}

impl ExtractorConfig {
    pub fn from_settings(
        extraction: &ExtractionSettings,
        generation: &GenerationSettings,
        stages: &StageSettings,
    ) -> Self {
        Self {
            max_insights: extraction.max_insights,
            sentences_per_insight: extraction.sentences_per_insight.max(1),
            min_content_words: extraction.min_content_words.max(1),
            max_themes: extraction.max_themes,
            creativity: extraction.creativity,
            generation_retries: stages.generation_retries,
            max_concurrent: generation.max_concurrent,
        }
    }
}

/// Extracts insights from segments.
pub struct Extractor {
    config: ExtractorConfig,
    generator: Arc<dyn Generator>,
    prompts: Arc<Prompts>,
}

impl Extractor {
    pub fn new(config: ExtractorConfig, generator: Arc<dyn Generator>, prompts: Arc<Prompts>) -> Self {
        Self {
            config,
            generator,
            prompts,
        }
    }

    /// Extract insights. Skipped fragments and dropped insights are reported as diagnostics.
    #[instrument(skip_all, fields(segments = segments.len()))]
    pub async fn extract(
        &self,
        segments: &[Segment],
        cancel: &CancellationToken,
    ) -> Result<StageOutput<Vec<Insight>>> {
        let mut diagnostics = Vec::new();
        let mut usable: Vec<&Segment> = Vec::with_capacity(segments.len());

        for segment in segments {
            if cancel.is_cancelled() {
                return Err(RecastError::Cancelled);
            }
            let words = content_words(segment.clean_text()).len();
            if words < self.config.min_content_words {
                debug!("Skipping segment {} ({} content words)", segment.index(), words);
                diagnostics.push(
                    Diagnostic::partial(
                        Stage::Insights,
                        format!("skipped unintelligible fragment ({} content words)", words),
                    )
                    .for_segment(segment.index()),
                );
            } else {
                usable.push(segment);
            }
        }

        // Skipped fragments take no part in scoring, themes or quoting.
        let index = KeywordIndex::build(usable.iter().map(|s| s.clean_text()));
        let mut candidates: Vec<Insight> = usable.iter().map(|s| self.key_point(&index, s)).collect();
        candidates.extend(self.themes(&index, &usable));
        let kept = cap_by_score(merge_duplicates(candidates), self.config.max_insights);

        let requests: Vec<GenerationRequest> = kept
            .iter()
            .map(|insight| self.request(insight, segments))
            .collect();
        let outputs = generate_all(
            self.generator.as_ref(),
            &requests,
            self.config.generation_retries,
            self.config.max_concurrent,
            cancel,
        )
        .await?;

        let mut insights = Vec::with_capacity(kept.len());
        for (insight, output) in kept.into_iter().zip(outputs) {
            match output {
                Ok(content) => insights.push(Insight { content, ..insight }),
                Err(e) => diagnostics.push(Diagnostic::partial(
                    Stage::Insights,
                    format!("dropped insight '{}': {}", insight.title, e),
                )),
            }
        }

        info!(
            "Extracted {} insights from {} segments ({} diagnostics)",
            insights.len(),
            segments.len(),
            diagnostics.len()
        );
        Ok(StageOutput::new(insights, diagnostics))
    }

    /// Key point of one intelligible segment.
    fn key_point(&self, index: &KeywordIndex, segment: &Segment) -> Insight {
        let clean = segment.clean_text();
        let sentences = split_sentences(clean);
        let picked = best_sentences(index, &sentences, self.config.sentences_per_insight);
        let content = picked.iter().map(|&i| sentences[i]).collect::<Vec<_>>().join(" ");
        let score = picked.iter().map(|&i| index.sentence_score(sentences[i])).sum();

        let title = index
            .top_terms(clean, 2)
            .iter()
            .map(|t| title_case(t))
            .collect::<Vec<_>>()
            .join(" and ");

        Insight {
            title,
            content,
            kind: InsightKind::KeyPoint,
            source_segments: vec![segment.index()],
            score,
        }
    }

    /// Theme insights for terms recurring across segments.
    fn themes(&self, index: &KeywordIndex, segments: &[&Segment]) -> Vec<Insight> {
        let vocabulary: Vec<HashSet<String>> = segments
            .iter()
            .map(|s| content_words(s.clean_text()).into_iter().collect())
            .collect();

        let mut themes = Vec::new();
        for term in index.themes(self.config.max_themes) {
            let sources: Vec<usize> = segments
                .iter()
                .zip(&vocabulary)
                .filter(|(_, words)| words.contains(&term))
                .map(|(s, _)| s.index())
                .collect();
            if sources.len() < 2 {
                continue;
            }

            // (segment, sentence, score)
            let mut mentions: Vec<(usize, &str, f32)> = Vec::new();
            for segment in segments.iter().filter(|s| sources.contains(&s.index())) {
                for sentence in split_sentences(segment.clean_text()) {
                    if content_words(sentence).contains(&term) {
                        mentions.push((segment.index(), sentence, index.sentence_score(sentence)));
                    }
                }
            }

            let mut order: Vec<usize> = (0..mentions.len()).collect();
            order.sort_by(|&a, &b| {
                mentions[b]
                    .2
                    .partial_cmp(&mentions[a].2)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.cmp(&b))
            });
            let mut best: Vec<usize> = order.into_iter().take(2).collect();
            best.sort_unstable();
            if best.is_empty() {
                continue;
            }

            let content = best.iter().map(|&i| mentions[i].1).collect::<Vec<_>>().join(" ");
            let score = index.weight(&term) + best.iter().map(|&i| mentions[i].2).sum::<f32>();

            themes.push(Insight {
                title: format!("Theme: {}", title_case(&term)),
                content,
                kind: InsightKind::Theme,
                source_segments: sources,
                score,
            });
        }
        themes
    }

    fn request(&self, insight: &Insight, segments: &[Segment]) -> GenerationRequest {
        let source = insight
            .source_segments
            .iter()
            .filter_map(|&i| segments.get(i))
            .map(Segment::clean_text)
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut vars = HashMap::new();
        vars.insert("title".to_string(), insight.title.clone());
        vars.insert("draft".to_string(), insight.content.clone());
        vars.insert("source".to_string(), truncate_chars(&source, MAX_SOURCE_CHARS).to_string());

        let user = self.prompts.render_with_custom(&self.prompts.insights.user, &vars);
        GenerationRequest::new(GenerationKind::Insight, insight.content.clone())
            .with_prompts(self.prompts.insights.system.clone(), user)
            .with_temperature(self.config.creativity)
    }
}

/// Merge insights sharing a normalized title: keep the longer content, union the sources.
pub fn merge_duplicates(candidates: Vec<Insight>) -> Vec<Insight> {
    let mut merged: Vec<Insight> = Vec::with_capacity(candidates.len());
    let mut by_title: HashMap<String, usize> = HashMap::new();

    for insight in candidates {
        let key = insight.normalized_title();
        match by_title.get(&key) {
            Some(&pos) => {
                let existing = &mut merged[pos];
                if insight.content.chars().count() > existing.content.chars().count() {
                    existing.content = insight.content;
                }
                existing.score = existing.score.max(insight.score);
                existing.source_segments.extend(insight.source_segments);
                existing.source_segments.sort_unstable();
                existing.source_segments.dedup();
            }
            None => {
                by_title.insert(key, merged.len());
                merged.push(insight);
            }
        }
    }

    merged
}

/// Keep the `max` highest scoring insights in their original order.
fn cap_by_score(insights: Vec<Insight>, max: usize) -> Vec<Insight> {
    if insights.len() <= max {
        return insights;
    }

    let mut order: Vec<usize> = (0..insights.len()).collect();
    order.sort_by(|&a, &b| {
        insights[b]
            .score
            .partial_cmp(&insights[a].score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.cmp(&b))
    });
    let keep: HashSet<usize> = order.into_iter().take(max).collect();

    insights
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, insight)| insight)
        .collect()
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ExtractiveGenerator;
    use crate::segmenter::Segmenter;
    use crate::transcript::Transcript;
    use async_trait::async_trait;

    const TALK: &str = "I started pricing our product far too low. Customers assumed cheap meant flimsy.\n\n\
        We doubled the pricing overnight. Churn dropped and customers trusted us more.\n\n\
        My advice is simple. Test your pricing early and listen to customers.";

    fn segments(text: &str) -> Vec<Segment> {
        Segmenter::default().segment(&Transcript::new(text, "talk.txt")).unwrap()
    }

    fn extractor(config: ExtractorConfig, generator: Arc<dyn Generator>) -> Extractor {
        Extractor::new(config, generator, Arc::new(Prompts::default()))
    }

    fn insight(title: &str, content: &str, sources: Vec<usize>, score: f32) -> Insight {
        Insight {
            title: title.to_string(),
            content: content.to_string(),
            kind: InsightKind::KeyPoint,
            source_segments: sources,
            score,
        }
    }

    struct Broken;

    #[async_trait]
    impl Generator for Broken {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            Err(RecastError::Generation("model offline".to_string()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_extracts_traceable_insights() {
        let segments = segments(TALK);
        let out = extractor(ExtractorConfig::default(), Arc::new(ExtractiveGenerator::new()))
            .extract(&segments, &CancellationToken::new())
            .await
            .unwrap();

        assert!(!out.items.is_empty());
        for insight in &out.items {
            assert!(!insight.title.is_empty());
            assert!(!insight.source_segments.is_empty());
            assert!(insight.source_segments.iter().all(|&i| i < segments.len()));
            for sentence in split_sentences(&insight.content) {
                assert!(TALK.contains(sentence), "not quoted from transcript: {}", sentence);
            }
        }
        assert!(out.items.iter().any(|i| i.kind == InsightKind::Theme));
    }

    #[tokio::test]
    async fn test_deterministic() {
        let segments = segments(TALK);
        let extractor = extractor(ExtractorConfig::default(), Arc::new(ExtractiveGenerator::new()));
        let cancel = CancellationToken::new();
        let a = extractor.extract(&segments, &cancel).await.unwrap();
        let b = extractor.extract(&segments, &cancel).await.unwrap();
        assert_eq!(a.items, b.items);
    }

    #[tokio::test]
    async fn test_unintelligible_fragment_skipped() {
        let segments = segments("Okay yeah.\n\nWe rebuilt the billing system from scratch this spring.");
        let out = extractor(ExtractorConfig::default(), Arc::new(ExtractiveGenerator::new()))
            .extract(&segments, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(out.items.len(), 1);
        assert_eq!(out.items[0].source_segments, vec![1]);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].segment, Some(0));
    }

    #[tokio::test]
    async fn test_skipped_fragment_never_sourced() {
        let pricing = "Our pricing was far too low for years. We raised pricing and customers stayed.";
        let text = format!("Pricing matters.\n\n{}\n\n{}", pricing, pricing);
        let segments = segments(&text);
        let out = extractor(ExtractorConfig::default(), Arc::new(ExtractiveGenerator::new()))
            .extract(&segments, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(out.diagnostics[0].segment, Some(0));
        assert!(!out.items.is_empty());
        for insight in &out.items {
            assert!(!insight.source_segments.contains(&0), "{:?}", insight);
            assert!(!insight.content.contains("Pricing matters"));
        }
    }

    #[tokio::test]
    async fn test_generation_failures_drop_insights() {
        let segments = segments(TALK);
        let out = extractor(ExtractorConfig::default(), Arc::new(Broken))
            .extract(&segments, &CancellationToken::new())
            .await
            .unwrap();

        assert!(out.items.is_empty());
        assert!(out.diagnostics.iter().any(|d| d.message.contains("model offline")));
    }

    #[tokio::test]
    async fn test_max_insights_cap() {
        let config = ExtractorConfig {
            max_insights: 2,
            ..ExtractorConfig::default()
        };
        let out = extractor(config, Arc::new(ExtractiveGenerator::new()))
            .extract(&segments(TALK), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out.items.len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = extractor(ExtractorConfig::default(), Arc::new(ExtractiveGenerator::new()))
            .extract(&segments(TALK), &cancel)
            .await;
        assert!(matches!(result, Err(RecastError::Cancelled)));
    }

    #[test]
    fn test_merge_duplicates() {
        let merged = merge_duplicates(vec![
            insight("Pricing and Customers", "Short.", vec![2], 1.0),
            insight("Onboarding", "Other.", vec![1], 0.5),
            insight("pricing AND customers!", "A much longer statement.", vec![0, 2], 2.0),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].title, "Pricing and Customers");
        assert_eq!(merged[0].content, "A much longer statement.");
        assert_eq!(merged[0].source_segments, vec![0, 2]);
        assert_eq!(merged[0].score, 2.0);
    }

    #[test]
    fn test_cap_keeps_order() {
        let capped = cap_by_score(
            vec![
                insight("a", "a", vec![0], 1.0),
                insight("b", "b", vec![1], 3.0),
                insight("c", "c", vec![2], 2.0),
            ],
            2,
        );
        let titles: Vec<&str> = capped.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "c"]);
    }
}
