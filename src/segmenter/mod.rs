//! Transcript segmentation.
//!
//! Splits a normalized transcript into ordered, contiguous segments. Natural
//! boundaries are preferred in this order: paragraph breaks, speaker turns,
//! sentences and line breaks, words. Only a single token longer than the
//! maximum segment size is ever split inside itself.

mod boundary;

use crate::config::SegmenterSettings;
use crate::error::{RecastError, Result};
use crate::transcript::{ArtifactCleaner, Transcript};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, instrument};

/// A contiguous span of the normalized transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    index: usize,
    start: usize,
    end: usize,
    text: String,
    clean: String,
    speaker: Option<String>,
}

impl Segment {
    /// Stable position of this segment.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Byte span in the normalized transcript, trailing whitespace included.
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Trimmed segment text as it appears in the transcript.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text with speaker labels, timestamps and filler words removed.
    pub fn clean_text(&self) -> &str {
        &self.clean
    }

    /// Speaker of the turn this segment belongs to, if labelled.
    pub fn speaker(&self) -> Option<&str> {
        self.speaker.as_deref()
    }

    /// Length of the trimmed text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Segmenter configuration.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Maximum characters per segment.
    pub max_chars: usize,
    /// Filler words removed from `clean_text`.
    pub filler_words: Vec<String>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        SegmenterSettings::default().into()
    }
}

impl From<SegmenterSettings> for SegmenterConfig {
    fn from(settings: SegmenterSettings) -> Self {
        Self {
            max_chars: settings.max_chars,
            filler_words: settings.filler_words,
        }
    }
}

/// Splits transcripts into segments.
#[derive(Debug, Clone)]
pub struct Segmenter {
    max_chars: usize,
    cleaner: ArtifactCleaner,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            max_chars: config.max_chars.max(1),
            cleaner: ArtifactCleaner::new(&config.filler_words),
        }
    }

    /// Segment a transcript.
    #[instrument(skip_all, fields(file = %transcript.file_name()))]
    pub fn segment(&self, transcript: &Transcript) -> Result<Vec<Segment>> {
        self.segment_normalized(transcript.text())
    }

    /// Segment already-normalized text (see [`crate::transcript::normalize`]).
    pub fn segment_normalized(&self, text: &str) -> Result<Vec<Segment>> {
        if text.trim().is_empty() {
            return Err(RecastError::EmptyInput);
        }

        let mut segments = Vec::new();
        for unit in boundary::units(text) {
            let atoms = boundary::atoms(text, unit.span.clone(), self.max_chars);
            let cuts = boundary::pack(text, &atoms, unit.span.end, self.max_chars);

            for (i, &start) in cuts.iter().enumerate() {
                let end = cuts.get(i + 1).copied().unwrap_or(unit.span.end);
                let raw = text[start..end].trim();
                segments.push(Segment {
                    index: segments.len(),
                    start,
                    end,
                    text: raw.to_string(),
                    clean: self.cleaner.clean(raw),
                    speaker: unit.speaker.clone(),
                });
            }
        }

        debug!(
            "Segmented {} chars into {} segments (max {} chars)",
            text.len(),
            segments.len(),
            self.max_chars
        );
        Ok(segments)
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(SegmenterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{collapse_whitespace, normalize};

    fn segmenter(max_chars: usize) -> Segmenter {
        Segmenter::new(SegmenterConfig {
            max_chars,
            ..SegmenterConfig::default()
        })
    }

    fn assert_round_trip(text: &str, segments: &[Segment]) {
        let rebuilt: String = segments.iter().map(|s| &text[s.span()]).collect();
        assert_eq!(rebuilt, text);

        // Separate trimmed texts only where the source has whitespace between them.
        let mut joined = String::new();
        for segment in segments {
            let span = segment.span();
            let spaced = text[..span.start].ends_with(char::is_whitespace)
                || text[span].starts_with(char::is_whitespace);
            if !joined.is_empty() && spaced {
                joined.push(' ');
            }
            joined.push_str(segment.text());
        }
        assert_eq!(collapse_whitespace(&joined), collapse_whitespace(text));
    }

    #[test]
    fn test_empty_input_fails() {
        let err = Segmenter::default().segment(&Transcript::new(" \n\t ", "blank.txt"));
        assert!(matches!(err, Err(RecastError::EmptyInput)));
    }

    #[test]
    fn test_three_paragraphs_three_segments() {
        let transcript = Transcript::new(
            "We launched the product in spring.\n\nCustomers loved the onboarding.\n\nNext year we expand to Europe.",
            "talk.txt",
        );
        let segments = Segmenter::default().segment(&transcript).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].text(), "Customers loved the onboarding.");
        assert_eq!(segments.iter().map(Segment::index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_round_trip(transcript.text(), &segments);
    }

    #[test]
    fn test_speaker_turns_split() {
        let transcript = Transcript::new(
            "Host: Welcome to the show.\nGuest: Thanks, um, glad to be here.\nHost: Let's start.",
            "show.txt",
        );
        let segments = Segmenter::default().segment(&transcript).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].speaker(), Some("Guest"));
        assert_eq!(segments[1].clean_text(), "Thanks, glad to be here.");
    }

    #[test]
    fn test_long_paragraph_respects_max_and_sentences() {
        let sentence = "This sentence has exactly some words in it.";
        let paragraph = vec![sentence; 12].join(" ");
        let text = normalize(&paragraph);
        let segments = segmenter(100).segment_normalized(&text).unwrap();

        assert!(segments.len() > 1);
        for segment in &segments {
            assert!(segment.char_len() <= 100, "segment too long: {}", segment.char_len());
            assert!(!segment.text().is_empty());
            assert!(segment.text().ends_with('.'), "split mid-sentence: {}", segment.text());
        }
        assert_round_trip(&text, &segments);
    }

    #[test]
    fn test_run_on_sentence_splits_on_words() {
        let text = normalize(&"word ".repeat(60));
        let segments = segmenter(50).segment_normalized(&text).unwrap();
        for segment in &segments {
            assert!(segment.char_len() <= 50);
            assert!(segment.text().split(' ').all(|w| w == "word"));
        }
        assert_round_trip(&text, &segments);
    }

    #[test]
    fn test_unicode_and_overlong_token() {
        let text = normalize(&format!("Café naïve résumé. {} end.", "x".repeat(130)));
        let segments = segmenter(40).segment_normalized(&text).unwrap();
        for segment in &segments {
            assert!(segment.char_len() <= 40);
        }
        assert_round_trip(&text, &segments);
    }

    #[test]
    fn test_size_bound_over_many_shapes() {
        let samples = [
            "Short.",
            "A: one\nB: two\n\nC: three. Four five six seven. Eight!",
            "No punctuation at all but quite a few words that keep going and going and going along",
            "Line one\nLine two\nLine three\n\n\n\nFinal paragraph here.",
        ];
        for max in [40, 60, 200] {
            for sample in samples {
                let text = normalize(sample);
                let segments = segmenter(max).segment_normalized(&text).unwrap();
                assert!(!segments.is_empty());
                for segment in &segments {
                    assert!(segment.char_len() <= max);
                    assert!(!segment.text().is_empty());
                }
                assert_round_trip(&text, &segments);
            }
        }
    }
}
