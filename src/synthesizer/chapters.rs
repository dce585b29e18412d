//! Chapter planning.

use super::{contiguous_groups, fill_sentences, lead_insight, DocumentPlan};
use crate::analysis::{split_sentences, title_case, KeywordIndex};
use crate::content::Insight;
use crate::segmenter::Segment;

/// Plan up to `count` chapters over contiguous runs of segments.
pub(super) fn plan(
    segments: &[Segment],
    insights: &[Insight],
    count: usize,
    target_chars: usize,
) -> Vec<DocumentPlan> {
    let groups = contiguous_groups(segments, count, Segment::char_len);

    groups
        .into_iter()
        .filter_map(|group| {
            let (draft, sources) = draft(group, target_chars);
            (!draft.is_empty()).then(|| (topic(group, insights), draft, sources))
        })
        .enumerate()
        .map(|(n, (topic, draft, sources))| DocumentPlan {
            title: format!("Chapter {}: {}", n + 1, topic),
            draft,
            source_segments: sources,
        })
        .collect()
}

/// The group's lead insight title, or its top keywords.
fn topic(group: &[Segment], insights: &[Insight]) -> String {
    let sources: Vec<usize> = group.iter().map(Segment::index).collect();
    if let Some(lead) = lead_insight(insights, &sources) {
        return lead.title.clone();
    }

    let index = KeywordIndex::build(group.iter().map(Segment::clean_text));
    let text = group.iter().map(Segment::clean_text).collect::<Vec<_>>().join(" ");
    let terms = index.top_terms(&text, 2);
    if terms.is_empty() {
        "Untitled".to_string()
    } else {
        terms.iter().map(|t| title_case(t)).collect::<Vec<_>>().join(" and ")
    }
}

/// One paragraph per segment, cut at a sentence boundary once the target is reached.
fn draft(group: &[Segment], target_chars: usize) -> (String, Vec<usize>) {
    let mut paragraphs = Vec::new();
    let mut sources = Vec::new();
    let mut used = 0;

    for segment in group {
        let sentences = split_sentences(segment.clean_text());
        if sentences.is_empty() {
            continue;
        }

        let mut kept = Vec::new();
        let complete = fill_sentences(&mut kept, &mut used, &sentences, target_chars);
        if !kept.is_empty() {
            paragraphs.push(kept.join(" "));
            sources.push(segment.index());
        }
        if !complete {
            break;
        }
    }

    (paragraphs.join("\n\n"), sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::Segmenter;
    use crate::transcript::Transcript;

    fn segments(text: &str) -> Vec<Segment> {
        Segmenter::default().segment(&Transcript::new(text, "talk.txt")).unwrap()
    }

    #[test]
    fn test_draft_stops_at_target() {
        let segments = segments("First point here. Second point here.\n\nThird point here.");
        let (draft, sources) = draft(&segments, 20);
        assert_eq!(draft, "First point here.");
        assert_eq!(sources, vec![0]);
    }

    #[test]
    fn test_draft_keeps_paragraphs() {
        let segments = segments("First point here.\n\nSecond point here.");
        let (draft, sources) = draft(&segments, 1000);
        assert_eq!(draft, "First point here.\n\nSecond point here.");
        assert_eq!(sources, vec![0, 1]);
    }

    #[test]
    fn test_topic_falls_back_to_keywords() {
        let segments = segments("Billing systems break. Billing teams suffer.");
        assert_eq!(topic(&segments, &[]).split(" and ").next(), Some("Billing"));
    }

    #[test]
    fn test_plan_numbers_chapters() {
        let segments = segments("One idea about pricing.\n\nTwo ideas about hiring.\n\nThree ideas about growth.");
        let plans = plan(&segments, &[], 3, 500);
        let titles: Vec<&str> = plans.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles.len(), 3);
        assert!(titles[2].starts_with("Chapter 3: "));
    }

    #[test]
    fn test_numbering_skips_empty_groups() {
        let segments = segments("One idea about pricing.\n\nUm.\n\nThree ideas about growth.");
        let plans = plan(&segments, &[], 3, 500);
        let titles: Vec<&str> = plans.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles.len(), 2);
        assert!(titles[0].starts_with("Chapter 1: "));
        assert!(titles[1].starts_with("Chapter 2: "));
        assert_eq!(plans[1].source_segments, vec![2]);
    }
}
