//! Content produced by the pipeline and its persisted JSON shape.
//!
//! [`ProcessedResult`] is the typed result with segment references.
//! [`ProcessedData`] is the stored/served form: an object with exactly the keys
//! `insights`, `chapters`, `blogs` and `social`, where each value is either a
//! plain string or an array of `{ "title"?, "content" }` items.

use serde::{Deserialize, Serialize};

/// Kind of insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// A point made in a specific part of the transcript.
    KeyPoint,
    /// A topic recurring across the transcript.
    Theme,
}

/// An extracted insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub title: String,
    pub content: String,
    pub kind: InsightKind,
    /// Indices of the segments this insight was derived from.
    pub source_segments: Vec<usize>,
    /// Extraction score, used for ranking.
    pub score: f32,
}

impl Insight {
    /// Title normalized for duplicate detection.
    pub fn normalized_title(&self) -> String {
        normalize_title(&self.title)
    }
}

/// Lowercase alphanumeric words separated by single spaces.
pub fn normalize_title(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Kind of long-form document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Chapter,
    Blog,
}

/// A chapter or blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedDocument {
    pub kind: DocumentKind,
    pub title: String,
    pub content: String,
    pub source_segments: Vec<usize>,
}

/// A short-form social post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    /// Display position.
    pub position: usize,
    pub content: String,
    pub source_segments: Vec<usize>,
}

/// Everything derived from one transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessedResult {
    pub insights: Vec<Insight>,
    pub chapters: Vec<DerivedDocument>,
    pub blogs: Vec<DerivedDocument>,
    pub social: Vec<SocialPost>,
}

impl ProcessedResult {
    /// Convert to the persisted JSON shape.
    pub fn to_data(&self) -> ProcessedData {
        ProcessedData {
            insights: Section::Items(
                self.insights
                    .iter()
                    .map(|i| SectionItem::titled(&i.title, &i.content))
                    .collect(),
            ),
            chapters: Section::Items(
                self.chapters
                    .iter()
                    .map(|d| SectionItem::titled(&d.title, &d.content))
                    .collect(),
            ),
            blogs: Section::Items(
                self.blogs
                    .iter()
                    .map(|d| SectionItem::titled(&d.title, &d.content))
                    .collect(),
            ),
            social: Section::Items(
                self.social
                    .iter()
                    .map(|p| SectionItem {
                        title: None,
                        content: p.content.clone(),
                    })
                    .collect(),
            ),
        }
    }
}

/// One of the four result sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKey {
    Insights,
    Chapters,
    Blogs,
    Social,
}

impl SectionKey {
    pub const ALL: [SectionKey; 4] = [
        SectionKey::Insights,
        SectionKey::Chapters,
        SectionKey::Blogs,
        SectionKey::Social,
    ];

    /// JSON key.
    pub fn key(&self) -> &'static str {
        match self {
            SectionKey::Insights => "insights",
            SectionKey::Chapters => "chapters",
            SectionKey::Blogs => "blogs",
            SectionKey::Social => "social",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            SectionKey::Insights => "Insights",
            SectionKey::Chapters => "Book Chapters",
            SectionKey::Blogs => "Blog Posts",
            SectionKey::Social => "Social Media",
        }
    }
}

impl std::str::FromStr for SectionKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "insights" => Ok(SectionKey::Insights),
            "chapters" => Ok(SectionKey::Chapters),
            "blogs" => Ok(SectionKey::Blogs),
            "social" => Ok(SectionKey::Social),
            _ => Err(format!(
                "Unknown section: {}. Use insights, chapters, blogs or social.",
                s
            )),
        }
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// An item of an array-shaped section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
}

impl SectionItem {
    fn titled(title: &str, content: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            content: content.to_string(),
        }
    }
}

/// Section value: a plain string or a list of items. Both shapes are accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Section {
    Text(String),
    Items(Vec<SectionItem>),
}

impl Default for Section {
    fn default() -> Self {
        Section::Items(Vec::new())
    }
}

impl Section {
    /// True when there is nothing to show.
    pub fn is_empty(&self) -> bool {
        match self {
            Section::Text(text) => text.trim().is_empty(),
            Section::Items(items) => items.iter().all(|i| i.content.trim().is_empty()),
        }
    }

    /// Number of displayable entries.
    pub fn len(&self) -> usize {
        match self {
            Section::Text(text) if text.trim().is_empty() => 0,
            Section::Text(_) => 1,
            Section::Items(items) => items.len(),
        }
    }

    /// Display entries as `(title, content)`; untitled entries get `"<section> N"`,
    /// a string section is titled by its key.
    pub fn entries(&self, key: SectionKey) -> Vec<(String, String)> {
        match self {
            Section::Text(text) if text.trim().is_empty() => Vec::new(),
            Section::Text(text) => vec![(key.key().to_string(), text.clone())],
            Section::Items(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let title = item
                        .title
                        .clone()
                        .filter(|t| !t.trim().is_empty())
                        .unwrap_or_else(|| format!("{} {}", key.key(), i + 1));
                    (title, item.content.clone())
                })
                .collect(),
        }
    }
}

/// Persisted processed content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedData {
    #[serde(default)]
    pub insights: Section,
    #[serde(default)]
    pub chapters: Section,
    #[serde(default)]
    pub blogs: Section,
    #[serde(default)]
    pub social: Section,
}

impl ProcessedData {
    /// Get a section by key.
    pub fn section(&self, key: SectionKey) -> &Section {
        match key {
            SectionKey::Insights => &self.insights,
            SectionKey::Chapters => &self.chapters,
            SectionKey::Blogs => &self.blogs,
            SectionKey::Social => &self.social,
        }
    }
}
