//! Lexical analysis shared by the extraction and generation stages.
//!
//! Everything here is deterministic: ties in scores are always broken by the
//! term itself so identical input produces identical rankings.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "about", "above", "actually", "after", "again", "against", "all", "also", "am", "an",
        "and", "any", "are", "aren't", "around", "as", "at", "be", "because", "been", "before",
        "being", "below", "between", "both", "but", "by", "can", "can't", "could", "couldn't",
        "did", "didn't", "do", "does", "doesn't", "doing", "don't", "down", "during", "each",
        "even", "ever", "every", "few", "for", "from", "further", "get", "gets", "getting", "go",
        "goes", "going", "gonna", "got", "had", "hadn't", "has", "hasn't", "have", "haven't",
        "having", "he", "he's", "her", "here", "hers", "herself", "him", "himself", "his", "how",
        "i", "i'd", "i'll", "i'm", "i've", "if", "in", "into", "is", "isn't", "it", "it's", "its",
        "itself", "just", "kind", "know", "let's", "like", "lot", "really", "many", "may", "me",
        "might", "more", "most", "much", "must", "my", "myself", "need", "no", "nor", "not",
        "now", "of", "off", "okay", "on", "once", "one", "only", "or", "other", "our", "ours",
        "ourselves", "out", "over", "own", "pretty", "right", "said", "same", "say", "says",
        "see", "she", "she's", "should", "shouldn't", "so", "some", "something", "sort", "still",
        "such", "sure", "than", "that", "that's", "the", "their", "theirs", "them",
        "themselves", "then", "there", "there's", "these", "they", "they're", "thing", "things",
        "think", "this", "those", "through", "to", "too", "under", "until", "up", "us", "very",
        "want", "wanna", "was", "wasn't", "way", "we", "we'd", "we'll", "we're", "we've",
        "well", "were", "weren't", "what", "what's", "when", "where", "which", "while", "who",
        "whom", "why", "will", "with", "won't", "would", "wouldn't", "yeah", "yes", "yet", "you",
        "you'd", "you'll", "you're", "you've", "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

/// Whether a lowercase word is a stopword.
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Lowercase word tokens; apostrophes inside words are kept.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|w| w.trim_matches(|c| c == '\'' || c == '\u{2019}').replace('\u{2019}', "'"))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

/// Content words: at least three characters, containing a letter, not a stopword.
pub fn content_words(text: &str) -> Vec<String> {
    tokenize(text)
        .filter(|w| w.chars().count() >= 3)
        .filter(|w| w.chars().any(char::is_alphabetic))
        .filter(|w| !is_stopword(w))
        .collect()
}

/// Split text into trimmed sentences on `.`, `!`, `?` (plus closing quotes) and line breaks.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        let boundary_end = if c == '\n' {
            Some(i)
        } else if matches!(c, '.' | '!' | '?') {
            let mut end = i + c.len_utf8();
            while let Some(&(j, next)) = iter.peek() {
                if matches!(next, '"' | '\'' | ')' | ']' | '\u{201d}' | '\u{2019}' | '.' | '!' | '?') {
                    end = j + next.len_utf8();
                    iter.next();
                } else {
                    break;
                }
            }
            match iter.peek() {
                Some(&(_, next)) if next.is_whitespace() => Some(end),
                None => Some(end),
                _ => None,
            }
        } else {
            None
        };

        if let Some(end) = boundary_end {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

/// Capitalize the first letter of a word.
pub fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Term statistics over a set of documents (segments).
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    term_frequency: HashMap<String, usize>,
    document_frequency: HashMap<String, usize>,
    documents: usize,
}

impl KeywordIndex {
    /// Build an index from document texts.
    pub fn build<'a>(documents: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::default();
        for doc in documents {
            index.documents += 1;
            let words = content_words(doc);
            let mut seen = HashSet::new();
            for word in words {
                *index.term_frequency.entry(word.clone()).or_insert(0) += 1;
                if seen.insert(word.clone()) {
                    *index.document_frequency.entry(word).or_insert(0) += 1;
                }
            }
        }
        index
    }

    /// Total occurrences of a term.
    pub fn frequency(&self, term: &str) -> usize {
        self.term_frequency.get(term).copied().unwrap_or(0)
    }

    /// Smoothed inverse document frequency; always positive.
    pub fn idf(&self, term: &str) -> f32 {
        let df = self.document_frequency.get(term).copied().unwrap_or(0).max(1) as f32;
        (1.0 + self.documents.max(1) as f32 / df).ln()
    }

    /// Global weight of a term: frequency damped by log, scaled by idf.
    pub fn weight(&self, term: &str) -> f32 {
        let tf = self.frequency(term) as f32;
        if tf == 0.0 {
            return 0.0;
        }
        (1.0 + tf.ln()) * self.idf(term)
    }

    /// Score a sentence by the weight of its content words, normalized by length.
    pub fn sentence_score(&self, sentence: &str) -> f32 {
        let words = content_words(sentence);
        if words.is_empty() {
            return 0.0;
        }
        let total: f32 = words.iter().map(|w| self.weight(w)).sum();
        total / (words.len() as f32).sqrt()
    }

    /// Top terms of a single text, scored by local count times global weight.
    pub fn top_terms(&self, text: &str, k: usize) -> Vec<String> {
        let mut local: HashMap<String, usize> = HashMap::new();
        for word in content_words(text) {
            *local.entry(word).or_insert(0) += 1;
        }
        let mut scored: Vec<(String, f32)> = local
            .into_iter()
            .map(|(term, count)| {
                let score = count as f32 * self.weight(&term).max(f32::EPSILON);
                (term, score)
            })
            .collect();
        rank(&mut scored);
        scored.into_iter().take(k).map(|(t, _)| t).collect()
    }

    /// Terms recurring across documents, most prominent first.
    pub fn themes(&self, k: usize) -> Vec<String> {
        let mut scored: Vec<(String, f32)> = self
            .term_frequency
            .iter()
            .filter(|(term, tf)| **tf >= 2 && self.document_frequency.get(*term).copied().unwrap_or(0) >= 2)
            .map(|(term, tf)| {
                let df = self.document_frequency.get(term).copied().unwrap_or(1) as f32;
                (term.clone(), *tf as f32 * df.sqrt())
            })
            .collect();
        rank(&mut scored);
        scored.into_iter().take(k).map(|(t, _)| t).collect()
    }
}

/// Positions of the `k` best scoring sentences, in original order.
///
/// Ties go to the earlier sentence.
pub fn best_sentences(index: &KeywordIndex, sentences: &[&str], k: usize) -> Vec<usize> {
    let mut scored: Vec<(usize, f32)> = sentences
        .iter()
        .enumerate()
        .map(|(i, s)| (i, index.sentence_score(s)))
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    let mut picked: Vec<usize> = scored.into_iter().take(k).map(|(i, _)| i).collect();
    picked.sort_unstable();
    picked
}

/// Sort by score descending, then term ascending.
fn rank(scored: &mut [(String, f32)]) {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
}
