//! Transcript model and text normalization.
//!
//! A [`Transcript`] is the immutable input of one pipeline run. Its text is
//! normalized once at construction so every later stage, and every segment
//! span, refers to the same canonical string.

mod artifacts;
mod voice;

pub use artifacts::{ArtifactCleaner, speaker_label};
pub use voice::{Voice, VoiceProfile};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A submitted transcript. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    file_name: String,
    raw_text: String,
    text: String,
    received_at: DateTime<Utc>,
}

impl Transcript {
    /// Create a transcript received now.
    pub fn new(raw_text: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self::received_at(raw_text, file_name, Utc::now())
    }

    /// Create a transcript with an explicit ingestion timestamp.
    pub fn received_at(
        raw_text: impl Into<String>,
        file_name: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        let raw_text = raw_text.into();
        let text = normalize(&raw_text);
        Self {
            file_name: file_name.into(),
            raw_text,
            text,
            received_at,
        }
    }

    /// Source file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Text exactly as submitted.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Normalized text that segment spans index into.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// When the transcript was received.
    pub fn received_at_time(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// True when there is nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

/// Normalize transcript text.
///
/// Line endings become `\n`, each line is trimmed and has inner whitespace runs
/// collapsed to one space, and any run of blank lines becomes a single blank
/// line (a paragraph break). The result has no leading or trailing whitespace.
pub fn normalize(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let mut out = String::with_capacity(unified.len());
    let mut pending_break = false;

    for line in unified.split('\n') {
        let line = collapse_inline_whitespace(line);
        if line.is_empty() {
            pending_break = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push_str(if pending_break { "\n\n" } else { "\n" });
        }
        out.push_str(&line);
        pending_break = false;
    }

    out
}

/// Collapse whitespace runs inside a single line and trim both ends.
fn collapse_inline_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse all whitespace, newlines included, to single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
