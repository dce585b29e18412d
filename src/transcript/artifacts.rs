//! Transcript artifact handling: speaker labels, timestamps and filler words.

use regex::Regex;
use std::sync::LazyLock;

static SPEAKER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[\[(]?\d{1,2}:\d{2}(?::\d{2})?(?:\.\d+)?[\])]?\s+)?([A-Z][A-Za-z0-9'.\-]*(?: [A-Z0-9][A-Za-z0-9'.\-]*){0,2}):\s",
    )
    .expect("speaker label pattern is valid")
});

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\[(]?\b\d{1,2}:\d{2}(?::\d{2})?(?:\.\d+)?\b[\])]?")
        .expect("timestamp pattern is valid")
});

static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([,.;:!?])").expect("punctuation pattern is valid"));

static REPEATED_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(?:\s*,)+").expect("comma pattern is valid"));

/// Capitalized words that look like labels but introduce prose.
const NOT_SPEAKERS: &[&str] = &[
    "Note", "Update", "Edit", "Tip", "Warning", "Example", "Summary", "Step", "Important", "PS",
    "P.S", "Disclaimer", "Source",
];

/// Detect a speaker label (optionally preceded by a timestamp) at the start of a line.
///
/// Returns the speaker name, e.g. `Some("Dr Jane")` for `"[00:12] Dr Jane: hi"`.
pub fn speaker_label(line: &str) -> Option<&str> {
    let caps = SPEAKER_LABEL.captures(line)?;
    let name = caps.get(1)?.as_str();
    if NOT_SPEAKERS.contains(&name) {
        return None;
    }
    Some(name)
}

/// Strips transcript artifacts from segment text.
#[derive(Debug, Clone)]
pub struct ArtifactCleaner {
    fillers: Option<Regex>,
}

impl ArtifactCleaner {
    /// Create a cleaner removing the given filler words (case-insensitive, whole words).
    pub fn new(filler_words: &[String]) -> Self {
        let alternatives: Vec<String> = filler_words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(regex::escape)
            .collect();

        let fillers = if alternatives.is_empty() {
            None
        } else {
            Regex::new(&format!(r"(?i)\b(?:{})\b[,.]?", alternatives.join("|"))).ok()
        };

        Self { fillers }
    }

    /// Remove speaker labels, timestamps and fillers; collapse whitespace.
    pub fn clean(&self, text: &str) -> String {
        let mut lines = Vec::new();
        for line in text.lines() {
            let line = match SPEAKER_LABEL.find(line) {
                Some(m) if speaker_label(line).is_some() => &line[m.end()..],
                _ => line,
            };
            lines.push(line);
        }
        let joined = lines.join(" ");

        let without_times = TIMESTAMP.replace_all(&joined, " ");
        let without_fillers = match &self.fillers {
            Some(re) => re.replace_all(&without_times, " ").into_owned(),
            None => without_times.into_owned(),
        };

        let collapsed = super::collapse_whitespace(&without_fillers);
        let tidied = SPACE_BEFORE_PUNCT.replace_all(&collapsed, "$1");
        let tidied = REPEATED_COMMA.replace_all(&tidied, ",");
        let tidied = tidied.trim_start_matches([',', '.', ';', ':', ' ']).trim();

        capitalize_first(tidied)
    }
}

impl Default for ArtifactCleaner {
    fn default() -> Self {
        Self::new(&crate::config::SegmenterSettings::default().filler_words)
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
