//! Voice and style markers detected from the speaker's own words.

use crate::analysis::{is_stopword, tokenize};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const FIRST_SINGULAR: &[&str] = &["i", "me", "my", "mine", "myself", "i'm", "i've", "i'd", "i'll"];
const FIRST_PLURAL: &[&str] = &["we", "us", "our", "ours", "ourselves", "we're", "we've", "we'll", "we'd"];
const SECOND: &[&str] = &["you", "your", "yours", "yourself", "yourselves", "you're", "you've", "you'll", "you'd"];

/// Maximum signature phrases kept.
const MAX_PHRASES: usize = 5;

/// Dominant narrative voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Voice {
    FirstPersonSingular,
    FirstPersonPlural,
    SecondPerson,
    ThirdPerson,
}

impl std::fmt::Display for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Voice::FirstPersonSingular => write!(f, "first person singular (I, my)"),
            Voice::FirstPersonPlural => write!(f, "first person plural (we, our)"),
            Voice::SecondPerson => write!(f, "second person, speaking directly to the reader (you)"),
            Voice::ThirdPerson => write!(f, "third person"),
        }
    }
}

/// Style markers of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub dominant: Voice,
    /// Share of personal pronouns that are first person (singular or plural).
    pub first_person_ratio: f32,
    /// Share of personal pronouns that are second person.
    pub second_person_ratio: f32,
    /// Recurring three-word phrases, most frequent first.
    pub signature_phrases: Vec<String>,
}

impl VoiceProfile {
    /// Detect the voice profile of a set of texts.
    pub fn detect<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let (mut singular, mut plural, mut second) = (0usize, 0usize, 0usize);
        let mut trigrams: HashMap<String, usize> = HashMap::new();

        for text in texts {
            let words: Vec<String> = tokenize(text).collect();
            for word in &words {
                let w = word.as_str();
                if FIRST_SINGULAR.contains(&w) {
                    singular += 1;
                } else if FIRST_PLURAL.contains(&w) {
                    plural += 1;
                } else if SECOND.contains(&w) {
                    second += 1;
                }
            }

            for window in words.windows(3) {
                if is_stopword(&window[0]) || is_stopword(&window[2]) {
                    continue;
                }
                *trigrams.entry(window.join(" ")).or_insert(0) += 1;
            }
        }

        let total = singular + plural + second;
        let dominant = if total == 0 {
            Voice::ThirdPerson
        } else if singular >= plural && singular >= second {
            Voice::FirstPersonSingular
        } else if plural >= second {
            Voice::FirstPersonPlural
        } else {
            Voice::SecondPerson
        };

        let ratio = |n: usize| if total == 0 { 0.0 } else { n as f32 / total as f32 };

        let mut phrases: Vec<(String, usize)> =
            trigrams.into_iter().filter(|(_, count)| *count >= 2).collect();
        phrases.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            dominant,
            first_person_ratio: ratio(singular + plural),
            second_person_ratio: ratio(second),
            signature_phrases: phrases.into_iter().take(MAX_PHRASES).map(|(p, _)| p).collect(),
        }
    }

    /// Comma-separated phrases for prompts, or a placeholder.
    pub fn phrases_for_prompt(&self) -> String {
        if self.signature_phrases.is_empty() {
            "(none detected)".to_string()
        } else {
            self.signature_phrases
                .iter()
                .map(|p| format!("\"{}\"", p))
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}
