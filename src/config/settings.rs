//! Configuration settings for Recast.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub segmenter: SegmenterSettings,
    pub extraction: ExtractionSettings,
    pub synthesis: SynthesisSettings,
    pub social: SocialSettings,
    pub generation: GenerationSettings,
    pub stages: StageSettings,
    pub store: StoreSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.recast".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Segmenter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterSettings {
    /// Maximum characters per segment.
    pub max_chars: usize,
    /// Filler words stripped from segment text before extraction.
    pub filler_words: Vec<String>,
}

impl Default for SegmenterSettings {
    fn default() -> Self {
        Self {
            max_chars: 1200,
            filler_words: ["um", "umm", "uh", "uhh", "erm", "hmm", "ah"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
        }
    }
}

/// Insight extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Maximum number of insights kept.
    pub max_insights: usize,
    /// Sentences quoted per key-point insight.
    pub sentences_per_insight: usize,
    /// Segments with fewer content words are skipped as unintelligible.
    pub min_content_words: usize,
    /// Number of transcript-wide theme insights.
    pub max_themes: usize,
    /// Sampling temperature used when an LLM refines insights (0.0-2.0).
    pub creativity: f32,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            max_insights: 12,
            sentences_per_insight: 2,
            min_content_words: 3,
            max_themes: 3,
            creativity: 0.2,
        }
    }
}

/// Chapter and blog synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisSettings {
    /// Target number of book chapters.
    pub chapter_count: usize,
    /// Target chapter length in characters.
    pub chapter_target_chars: usize,
    /// Target number of blog posts.
    pub blog_count: usize,
    /// Target blog post length in characters.
    pub blog_target_chars: usize,
    /// Sampling temperature used when an LLM writes documents.
    pub creativity: f32,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            chapter_count: 4,
            chapter_target_chars: 6000,
            blog_count: 3,
            blog_target_chars: 2500,
            creativity: 0.5,
        }
    }
}

/// Social post settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialSettings {
    /// Maximum number of posts.
    pub max_posts: usize,
    /// Hard character ceiling per post.
    pub max_chars: usize,
    /// Append hashtags derived from insight titles.
    pub hashtags: bool,
    /// Sampling temperature used when an LLM writes posts.
    pub creativity: f32,
}

impl Default for SocialSettings {
    fn default() -> Self {
        Self {
            max_posts: 5,
            max_chars: 280,
            hashtags: true,
            creativity: 0.7,
        }
    }
}

/// Generation backend type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProvider {
    /// Deterministic, offline: content is assembled from literal transcript sentences.
    #[default]
    Extractive,
    /// OpenAI chat completions rewrite the extractive drafts.
    OpenAI,
}

impl std::str::FromStr for GenerationProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "extractive" | "local" => Ok(GenerationProvider::Extractive),
            "openai" => Ok(GenerationProvider::OpenAI),
            _ => Err(format!("Unknown generation provider: {}", s)),
        }
    }
}

impl std::fmt::Display for GenerationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationProvider::Extractive => write!(f, "extractive"),
            GenerationProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Backend (extractive, openai).
    pub provider: GenerationProvider,
    /// Chat model for the openai backend.
    pub model: String,
    /// HTTP timeout for a single request.
    pub request_timeout_seconds: u64,
    /// Maximum concurrent generation requests within a stage.
    pub max_concurrent: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: GenerationProvider::Extractive,
            model: "gpt-4o-mini".to_string(),
            request_timeout_seconds: 120,
            max_concurrent: 3,
        }
    }
}

/// Per-stage time budgets and retry counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSettings {
    pub segmenting_timeout_seconds: u64,
    pub extracting_timeout_seconds: u64,
    pub chapters_timeout_seconds: u64,
    pub blogs_timeout_seconds: u64,
    pub social_timeout_seconds: u64,
    /// Retries after a stage timeout (whole-stage attempts = retries + 1).
    pub retries: u32,
    /// Retries after a failed generation request.
    pub generation_retries: u32,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            segmenting_timeout_seconds: 30,
            extracting_timeout_seconds: 120,
            chapters_timeout_seconds: 300,
            blogs_timeout_seconds: 300,
            social_timeout_seconds: 120,
            retries: 1,
            generation_retries: 1,
        }
    }
}

impl StageSettings {
    pub fn segmenting_timeout(&self) -> Duration {
        Duration::from_secs(self.segmenting_timeout_seconds)
    }

    pub fn extracting_timeout(&self) -> Duration {
        Duration::from_secs(self.extracting_timeout_seconds)
    }

    pub fn chapters_timeout(&self) -> Duration {
        Duration::from_secs(self.chapters_timeout_seconds)
    }

    pub fn blogs_timeout(&self) -> Duration {
        Duration::from_secs(self.blogs_timeout_seconds)
    }

    pub fn social_timeout(&self) -> Duration {
        Duration::from_secs(self.social_timeout_seconds)
    }
}

/// Record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.recast/records.db".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Reject values the pipeline cannot honor.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::RecastError;

        if self.segmenter.max_chars < 40 {
            return Err(RecastError::Config(format!(
                "segmenter.max_chars must be at least 40 (got {})",
                self.segmenter.max_chars
            )));
        }
        if self.social.max_chars < 20 {
            return Err(RecastError::Config(format!(
                "social.max_chars must be at least 20 (got {})",
                self.social.max_chars
            )));
        }
        if self.generation.max_concurrent == 0 {
            return Err(RecastError::Config(
                "generation.max_concurrent must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::RecastError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recast")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.store.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [synthesis]
            blog_count = 5

            [generation]
            provider = "openai"
            "#,
        )
        .unwrap();

        assert_eq!(settings.synthesis.blog_count, 5);
        assert_eq!(settings.synthesis.chapter_count, 4);
        assert_eq!(settings.generation.provider, GenerationProvider::OpenAI);
        assert_eq!(settings.social.max_chars, 280);
        assert_eq!(settings.stages.retries, 1);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.social.max_posts = 9;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.social.max_posts, 9);
    }

    #[test]
    fn test_validate_rejects_tiny_segments() {
        let mut settings = Settings::default();
        settings.segmenter.max_chars = 10;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("OpenAI".parse::<GenerationProvider>().unwrap(), GenerationProvider::OpenAI);
        assert!("bogus".parse::<GenerationProvider>().is_err());
    }
}
