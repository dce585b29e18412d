//! Boundary detection and greedy packing for the segmenter.
//!
//! All offsets are byte offsets into the normalized transcript and always fall
//! on a non-whitespace character, so spans built from consecutive offsets are
//! contiguous and never start with whitespace.

use crate::transcript::speaker_label;
use std::ops::Range;

/// A paragraph or speaker turn.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Unit {
    pub span: Range<usize>,
    pub speaker: Option<String>,
}

/// Split normalized text into paragraphs and speaker turns.
pub(super) fn units(text: &str) -> Vec<Unit> {
    let mut units: Vec<Unit> = Vec::new();
    let mut open = false;
    let mut offset = 0;

    for line in text.split('\n') {
        let line_start = offset;
        offset += line.len() + 1;

        if line.is_empty() {
            open = false;
            continue;
        }

        let speaker = speaker_label(line).map(str::to_string);
        if !open || speaker.is_some() {
            units.push(Unit {
                span: line_start..line_start,
                speaker,
            });
            open = true;
        }
    }

    let starts: Vec<usize> = units.iter().map(|u| u.span.start).collect();
    for (i, unit) in units.iter_mut().enumerate() {
        unit.span.end = starts.get(i + 1).copied().unwrap_or(text.len());
    }

    units
}

/// Atom start offsets within a unit: sentences, or words for over-long
/// sentences, or fixed-size character chunks for over-long words.
pub(super) fn atoms(text: &str, span: Range<usize>, max_chars: usize) -> Vec<usize> {
    let sentences = sentence_starts(text, span.clone());
    let mut atoms = Vec::with_capacity(sentences.len());

    for (i, &start) in sentences.iter().enumerate() {
        let end = sentences.get(i + 1).copied().unwrap_or(span.end);
        if char_len(text[start..end].trim_end()) <= max_chars {
            atoms.push(start);
            continue;
        }

        let words = word_starts(text, start..end);
        for (j, &word_start) in words.iter().enumerate() {
            let word_end = words.get(j + 1).copied().unwrap_or(end);
            let word = text[word_start..word_end].trim_end();
            if char_len(word) <= max_chars {
                atoms.push(word_start);
            } else {
                atoms.extend(char_chunk_starts(text, word_start..word_start + word.len(), max_chars));
            }
        }
    }

    atoms
}

/// Greedily pack atoms into cut points so no packed span exceeds `max_chars`
/// once trailing whitespace is trimmed.
pub(super) fn pack(text: &str, atoms: &[usize], unit_end: usize, max_chars: usize) -> Vec<usize> {
    let Some(&first) = atoms.first() else {
        return Vec::new();
    };

    let mut cuts = vec![first];
    // chars from the current cut up to the start of atom i
    let mut acc = 0;

    for i in 1..atoms.len() {
        acc += char_len(&text[atoms[i - 1]..atoms[i]]);
        let atom_end = atoms.get(i + 1).copied().unwrap_or(unit_end);
        let candidate = acc + char_len(text[atoms[i]..atom_end].trim_end());
        if candidate > max_chars {
            cuts.push(atoms[i]);
            acc = 0;
        }
    }

    cuts
}

/// Offsets where sentences begin: after `.`/`!`/`?` (and closing quotes) or a
/// line break, at the next non-whitespace character.
fn sentence_starts(text: &str, span: Range<usize>) -> Vec<usize> {
    let mut starts = vec![span.start];
    let mut after_boundary = false;
    let mut prev_terminal = false;

    for (i, c) in text[span.clone()].char_indices() {
        if c.is_whitespace() {
            if prev_terminal || c == '\n' {
                after_boundary = true;
            }
            prev_terminal = false;
            continue;
        }
        if after_boundary {
            starts.push(span.start + i);
            after_boundary = false;
        }
        prev_terminal = matches!(c, '.' | '!' | '?')
            || (prev_terminal && matches!(c, '"' | '\'' | ')' | ']' | '\u{201d}' | '\u{2019}'));
    }

    starts
}

/// Offsets where words begin.
fn word_starts(text: &str, span: Range<usize>) -> Vec<usize> {
    let mut starts = vec![span.start];
    let mut in_space = false;

    for (i, c) in text[span.clone()].char_indices() {
        if c.is_whitespace() {
            in_space = true;
        } else if in_space {
            starts.push(span.start + i);
            in_space = false;
        }
    }

    starts
}

/// Offsets splitting a single over-long token every `max_chars` characters.
fn char_chunk_starts(text: &str, span: Range<usize>, max_chars: usize) -> Vec<usize> {
    text[span.clone()]
        .char_indices()
        .enumerate()
        .filter(|(n, _)| n % max_chars == 0)
        .map(|(_, (i, _))| span.start + i)
        .collect()
}

pub(super) fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_split_paragraphs_and_speakers() {
        let text = "Intro line\nstill intro\n\nAlice: hi there\nBob: hello\nmore from bob";
        let units = units(text);
        let spans: Vec<&str> = units.iter().map(|u| text[u.span.clone()].trim_end()).collect();
        assert_eq!(
            spans,
            vec!["Intro line\nstill intro", "Alice: hi there", "Bob: hello\nmore from bob"]
        );
        assert_eq!(units[1].speaker.as_deref(), Some("Alice"));
        assert_eq!(units[2].speaker.as_deref(), Some("Bob"));
        assert_eq!(units.last().unwrap().span.end, text.len());
    }

    #[test]
    fn test_sentence_starts_skip_decimals() {
        let text = "Costs 3.5 dollars. Then \"done.\" Next";
        let starts = sentence_starts(text, 0..text.len());
        let pieces: Vec<&str> = starts.iter().map(|&s| &text[s..s + 4]).collect();
        assert_eq!(pieces, vec!["Cost", "Then", "Next"]);
    }

    #[test]
    fn test_pack_respects_max() {
        let text = "aaa bbb ccc ddd";
        let atoms = word_starts(text, 0..text.len());
        let cuts = pack(text, &atoms, text.len(), 7);
        assert_eq!(cuts, vec![0, 8]);
    }

    #[test]
    fn test_overlong_word_is_chunked() {
        let text = "abcdefghij";
        let atoms = atoms(text, 0..text.len(), 4);
        assert_eq!(atoms, vec![0, 4, 8]);
    }
}
