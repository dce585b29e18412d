//! Social post repurposing.
//!
//! One post per insight, highest scoring insights first, up to a configured
//! number of posts. Every post is gated against a hard character ceiling:
//! an over-long post is cut at a word boundary, an unusable one is generated
//! once more, and a post that still fails the gate is dropped.

use crate::analysis::{is_stopword, split_sentences, title_case, tokenize};
use crate::config::{GenerationSettings, Prompts, SocialSettings, StageSettings};
use crate::content::{Insight, SocialPost};
use crate::diagnostics::{Diagnostic, Stage, StageOutput};
use crate::error::{RecastError, Result};
use crate::generation::{generate_all, GenerationKind, GenerationRequest, Generator};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

const ELLIPSIS: char = '\u{2026}';
const MAX_HASHTAGS: usize = 2;

/// Repurposer configuration.
#[derive(Debug, Clone)]
pub struct RepurposerConfig {
    pub max_posts: usize,
    /// Hard ceiling in characters.
    pub max_chars: usize,
    pub hashtags: bool,
    pub creativity: f32,
    pub generation_retries: u32,
    pub max_concurrent: usize,
}

impl Default for RepurposerConfig {
    fn default() -> Self {
        Self::from_settings(
            &SocialSettings::default(),
            &GenerationSettings::default(),
            &StageSettings::default(),
        )
    }
}

impl RepurposerConfig {
    pub fn from_settings(
        social: &SocialSettings,
        generation: &GenerationSettings,
        stages: &StageSettings,
    ) -> Self {
        Self {
            max_posts: social.max_posts,
            max_chars: social.max_chars.max(1),
            hashtags: social.hashtags,
            creativity: social.creativity,
            generation_retries: stages.generation_retries,
            max_concurrent: generation.max_concurrent,
        }
    }
}

/// Turns insights into social posts.
pub struct Repurposer {
    config: RepurposerConfig,
    generator: Arc<dyn Generator>,
    prompts: Arc<Prompts>,
}

impl Repurposer {
    pub fn new(config: RepurposerConfig, generator: Arc<dyn Generator>, prompts: Arc<Prompts>) -> Self {
        Self {
            config,
            generator,
            prompts,
        }
    }

    /// Produce posts. Every returned post is within the character ceiling.
    #[instrument(skip_all, fields(insights = insights.len()))]
    pub async fn repurpose(
        &self,
        insights: &[Insight],
        cancel: &CancellationToken,
    ) -> Result<StageOutput<Vec<SocialPost>>> {
        if cancel.is_cancelled() {
            return Err(RecastError::Cancelled);
        }

        let chosen = select(insights, self.config.max_posts);
        let requests: Vec<GenerationRequest> = chosen
            .iter()
            .map(|insight| self.request(insight))
            .collect();
        let outputs = generate_all(
            self.generator.as_ref(),
            &requests,
            self.config.generation_retries,
            self.config.max_concurrent,
            cancel,
        )
        .await?;

        let mut gated: Vec<Option<String>> = Vec::with_capacity(chosen.len());
        let mut first_errors: Vec<Option<String>> = Vec::with_capacity(chosen.len());
        let mut retries = Vec::new();
        let mut retry_slots = Vec::new();

        for (slot, output) in outputs.into_iter().enumerate() {
            match output {
                Ok(text) => match gate(&text, self.config.max_chars) {
                    Some(post) => {
                        gated.push(Some(post));
                        first_errors.push(None);
                    }
                    None => {
                        debug!("Post for '{}' failed the length gate, regenerating", chosen[slot].title);
                        retries.push(self.retry_request(&text));
                        retry_slots.push(slot);
                        gated.push(None);
                        first_errors.push(Some(format!(
                            "no usable text within {} characters",
                            self.config.max_chars
                        )));
                    }
                },
                Err(e) => {
                    retries.push(self.request(chosen[slot]));
                    retry_slots.push(slot);
                    gated.push(None);
                    first_errors.push(Some(e.to_string()));
                }
            }
        }

        if !retries.is_empty() {
            let outputs = generate_all(
                self.generator.as_ref(),
                &retries,
                0,
                self.config.max_concurrent,
                cancel,
            )
            .await?;
            for (slot, output) in retry_slots.into_iter().zip(outputs) {
                gated[slot] = output.ok().and_then(|text| gate(&text, self.config.max_chars));
            }
        }

        let mut posts = Vec::new();
        let mut diagnostics = Vec::new();
        for ((insight, post), error) in chosen.iter().zip(gated).zip(first_errors) {
            match post {
                Some(content) => posts.push(SocialPost {
                    position: posts.len(),
                    content,
                    source_segments: insight.source_segments.clone(),
                }),
                None => diagnostics.push(Diagnostic::partial(
                    Stage::Social,
                    format!(
                        "dropped post for '{}': {}",
                        insight.title,
                        error.unwrap_or_else(|| "regeneration failed".to_string())
                    ),
                )),
            }
        }

        info!("Repurposed {} social posts", posts.len());
        Ok(StageOutput::new(posts, diagnostics))
    }

    fn request(&self, insight: &Insight) -> GenerationRequest {
        let draft = self.draft(insight);
        let mut vars = HashMap::new();
        vars.insert("title".to_string(), insight.title.clone());
        vars.insert("draft".to_string(), insight.content.clone());
        vars.insert("max_chars".to_string(), self.config.max_chars.to_string());

        GenerationRequest::new(GenerationKind::Social, draft)
            .with_prompts(
                self.prompts.social.system.clone(),
                self.prompts.render_with_custom(&self.prompts.social.user, &vars),
            )
            .with_temperature(self.config.creativity)
    }

    fn retry_request(&self, previous: &str) -> GenerationRequest {
        let mut vars = HashMap::new();
        vars.insert("draft".to_string(), previous.to_string());
        vars.insert("max_chars".to_string(), self.config.max_chars.to_string());

        GenerationRequest::new(GenerationKind::Social, previous)
            .with_prompts(
                self.prompts.social.system.clone(),
                self.prompts.render_with_custom(&self.prompts.social.retry, &vars),
            )
            .with_temperature(self.config.creativity)
    }

    /// Lead sentence of the insight, plus hashtags when they fit.
    fn draft(&self, insight: &Insight) -> String {
        let lead = split_sentences(&insight.content)
            .first()
            .map(|s| s.to_string())
            .unwrap_or_else(|| insight.content.trim().to_string());

        if !self.config.hashtags {
            return lead;
        }
        let tags = hashtags(&insight.title);
        if tags.is_empty() {
            return lead;
        }
        let tagged = format!("{} {}", lead, tags.join(" "));
        if tagged.chars().count() <= self.config.max_chars {
            tagged
        } else {
            lead
        }
    }
}

/// Highest scoring insights, at most `max`, kept in their original order.
fn select(insights: &[Insight], max: usize) -> Vec<&Insight> {
    let mut order: Vec<usize> = (0..insights.len()).collect();
    order.sort_by(|&a, &b| {
        insights[b]
            .score
            .partial_cmp(&insights[a].score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.cmp(&b))
    });
    order.truncate(max);
    order.sort_unstable();
    order.into_iter().map(|i| &insights[i]).collect()
}

/// Hashtags from the content words of a title.
fn hashtags(title: &str) -> Vec<String> {
    tokenize(title)
        .filter(|w| w.chars().all(char::is_alphanumeric))
        .filter(|w| w.chars().count() >= 3 && !is_stopword(w) && w != "theme")
        .take(MAX_HASHTAGS)
        .map(|w| format!("#{}", title_case(&w)))
        .collect()
}

/// Apply the length ceiling. Returns `None` when no usable text fits.
pub fn gate(text: &str, max_chars: usize) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.chars().count() <= max_chars {
        return Some(text.to_string());
    }
    truncate_at_word_boundary(text, max_chars)
}

/// Cut `text` at the last word boundary so that, with a trailing ellipsis, it
/// fits in `max_chars`. Returns `None` when no whole word fits.
pub fn truncate_at_word_boundary(text: &str, max_chars: usize) -> Option<String> {
    if text.chars().count() <= max_chars {
        return Some(text.to_string());
    }
    if max_chars < 2 {
        return None;
    }

    // byte offset just past the first (max_chars - 1) chars, leaving room for the ellipsis
    let limit = text
        .char_indices()
        .nth(max_chars - 1)
        .map(|(i, _)| i)
        .unwrap_or(text.len());

    let next_is_space = text[limit..].chars().next().is_some_and(char::is_whitespace);
    let cut = if next_is_space {
        limit
    } else {
        text[..limit].rfind(char::is_whitespace)?
    };

    let kept = text[..cut].trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-'));
    if kept.is_empty() {
        return None;
    }
    Some(format!("{}{}", kept, ELLIPSIS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::InsightKind;
    use crate::generation::ExtractiveGenerator;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn insight(title: &str, content: &str, score: f32) -> Insight {
        Insight {
            title: title.to_string(),
            content: content.to_string(),
            kind: InsightKind::KeyPoint,
            source_segments: vec![0],
            score,
        }
    }

    fn repurposer(config: RepurposerConfig, generator: Arc<dyn Generator>) -> Repurposer {
        Repurposer::new(config, generator, Arc::new(Prompts::default()))
    }

    /// Returns blank text on the first call for each request, the draft afterwards.
    struct BlankFirst {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Generator for BlankFirst {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok("   ".to_string())
            } else {
                Ok(request.draft.clone())
            }
        }

        fn name(&self) -> &str {
            "blank-first"
        }
    }

    #[test]
    fn test_truncate_at_word_boundary() {
        let text = "Test your pricing early and listen to customers";
        let cut = truncate_at_word_boundary(text, 20).unwrap();
        assert_eq!(cut, "Test your pricing\u{2026}");
        assert!(cut.chars().count() <= 20);

        assert_eq!(truncate_at_word_boundary("short", 20).unwrap(), "short");
        assert_eq!(truncate_at_word_boundary(&"x".repeat(50), 20), None);
    }

    #[test]
    fn test_truncate_cuts_exactly_at_space() {
        // 19 chars kept, then a space
        let cut = truncate_at_word_boundary("abcd efgh ijkl mnop qrst", 20).unwrap();
        assert_eq!(cut, "abcd efgh ijkl mnop\u{2026}");
    }

    #[test]
    fn test_gate_rejects_blank() {
        assert_eq!(gate("  \n ", 280), None);
        assert_eq!(gate(" fits ", 280), Some("fits".to_string()));
    }

    #[test]
    fn test_hashtags() {
        assert_eq!(hashtags("Pricing and Customers"), vec!["#Pricing", "#Customers"]);
        assert_eq!(hashtags("Theme: Hiring"), vec!["#Hiring"]);
    }

    #[tokio::test]
    async fn test_posts_never_exceed_ceiling() {
        let long = "We learned that pricing is a signal of quality and customers read it that way every single time they compare vendors side by side";
        let insights = vec![
            insight("Pricing and Quality", long, 2.0),
            insight("Onboarding", "Onboarding matters.", 1.0),
        ];
        let config = RepurposerConfig {
            max_chars: 60,
            ..RepurposerConfig::default()
        };
        let out = repurposer(config, Arc::new(ExtractiveGenerator::new()))
            .repurpose(&insights, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(out.items.len(), 2);
        for post in &out.items {
            assert!(post.content.chars().count() <= 60, "too long: {}", post.content);
        }
        assert!(out.items[0].content.ends_with('\u{2026}'));
        assert_eq!(out.items[1].content, "Onboarding matters. #Onboarding");
        assert_eq!(out.items[1].position, 1);
    }

    #[tokio::test]
    async fn test_unusable_post_is_dropped() {
        let insights = vec![insight("Naming", &"x".repeat(400), 1.0)];
        let out = repurposer(RepurposerConfig::default(), Arc::new(ExtractiveGenerator::new()))
            .repurpose(&insights, &CancellationToken::new())
            .await
            .unwrap();

        assert!(out.items.is_empty());
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].stage, Stage::Social);
    }

    #[tokio::test]
    async fn test_regenerates_once() {
        let generator = Arc::new(BlankFirst {
            calls: AtomicU32::new(0),
        });
        let config = RepurposerConfig {
            generation_retries: 0,
            hashtags: false,
            ..RepurposerConfig::default()
        };
        let insights = vec![insight("Hiring", "Hire slowly.", 1.0)];
        let out = repurposer(config, generator.clone())
            .repurpose(&insights, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(out.items.len(), 1);
        assert_eq!(out.items[0].content, "Hire slowly.");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_max_posts_prefers_high_scores() {
        let insights = vec![
            insight("Alpha", "Alpha point.", 1.0),
            insight("Beta", "Beta point.", 3.0),
            insight("Gamma", "Gamma point.", 2.0),
        ];
        let config = RepurposerConfig {
            max_posts: 2,
            hashtags: false,
            ..RepurposerConfig::default()
        };
        let out = repurposer(config, Arc::new(ExtractiveGenerator::new()))
            .repurpose(&insights, &CancellationToken::new())
            .await
            .unwrap();

        let contents: Vec<&str> = out.items.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["Beta point.", "Gamma point."]);
    }
}
