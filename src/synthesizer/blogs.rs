//! Blog post planning.

use super::{contiguous_groups, fill_sentences, DocumentPlan};
use crate::analysis::split_sentences;
use crate::content::{Insight, InsightKind};
use crate::segmenter::Segment;

/// Plan up to `count` blog posts, each over a contiguous run of insights in
/// transcript order. Key points are preferred; themes are used when there are none.
pub(super) fn plan(
    segments: &[Segment],
    insights: &[Insight],
    count: usize,
    target_chars: usize,
) -> Vec<DocumentPlan> {
    let mut ordered: Vec<&Insight> = insights
        .iter()
        .filter(|i| i.kind == InsightKind::KeyPoint)
        .collect();
    if ordered.is_empty() {
        ordered = insights.iter().collect();
    }
    ordered.sort_by_key(|i| i.source_segments.first().copied().unwrap_or(usize::MAX));

    contiguous_groups(&ordered, count, |_| 1)
        .into_iter()
        .filter_map(|group| build(segments, group, target_chars))
        .collect()
}

fn build(segments: &[Segment], group: &[&Insight], target_chars: usize) -> Option<DocumentPlan> {
    let lead = group.iter().copied().fold(None, |best: Option<&Insight>, candidate| match best {
        Some(b) if b.score >= candidate.score => Some(b),
        _ => Some(candidate),
    })?;

    let budget = (target_chars / group.len()).max(1);
    let mut sections = Vec::with_capacity(group.len());
    let mut sources: Vec<usize> = Vec::new();

    for insight in group {
        let paragraph = paragraph(segments, insight, budget);
        if paragraph.is_empty() {
            continue;
        }
        if group.len() > 1 {
            sections.push(format!("## {}\n\n{}", insight.title, paragraph));
        } else {
            sections.push(paragraph);
        }
        sources.extend(&insight.source_segments);
    }

    if sections.is_empty() {
        return None;
    }
    sources.sort_unstable();
    sources.dedup();

    Some(DocumentPlan {
        title: lead.title.clone(),
        draft: sections.join("\n\n"),
        source_segments: sources,
    })
}

/// The insight followed by further sentences from its source segments.
fn paragraph(segments: &[Segment], insight: &Insight, budget: usize) -> String {
    let mut used = insight.content.chars().count();
    let mut extra = Vec::new();

    for segment in insight.source_segments.iter().filter_map(|&i| segments.get(i)) {
        let fresh: Vec<&str> = split_sentences(segment.clean_text())
            .into_iter()
            .filter(|s| !insight.content.contains(s))
            .collect();
        if !fill_sentences(&mut extra, &mut used, &fresh, budget) {
            break;
        }
    }

    let mut paragraph = insight.content.trim().to_string();
    for sentence in extra {
        if !paragraph.is_empty() {
            paragraph.push(' ');
        }
        paragraph.push_str(sentence);
    }
    paragraph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::Segmenter;
    use crate::transcript::Transcript;

    fn insight(title: &str, content: &str, sources: Vec<usize>, score: f32) -> Insight {
        Insight {
            title: title.to_string(),
            content: content.to_string(),
            kind: InsightKind::KeyPoint,
            source_segments: sources,
            score,
        }
    }

    fn segments() -> Vec<Segment> {
        Segmenter::default()
            .segment(&Transcript::new(
                "Pricing was too low. We doubled it.\n\nHiring was slow. We paid well.",
                "talk.txt",
            ))
            .unwrap()
    }

    #[test]
    fn test_sections_for_multiple_insights() {
        let insights = vec![
            insight("Pricing", "Pricing was too low.", vec![0], 1.0),
            insight("Hiring", "Hiring was slow.", vec![1], 2.0),
        ];
        let plans = plan(&segments(), &insights, 1, 1000);

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].title, "Hiring");
        assert_eq!(
            plans[0].draft,
            "## Pricing\n\nPricing was too low. We doubled it.\n\n## Hiring\n\nHiring was slow. We paid well."
        );
        assert_eq!(plans[0].source_segments, vec![0, 1]);
    }

    #[test]
    fn test_one_post_per_insight() {
        let insights = vec![
            insight("Hiring", "Hiring was slow.", vec![1], 2.0),
            insight("Pricing", "Pricing was too low.", vec![0], 1.0),
        ];
        let plans = plan(&segments(), &insights, 5, 1000);

        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].title, "Pricing");
        assert!(!plans[0].draft.contains("##"));
    }

    #[test]
    fn test_budget_limits_extra_sentences() {
        let insights = vec![insight("Pricing", "Pricing was too low.", vec![0], 1.0)];
        let plans = plan(&segments(), &insights, 1, 10);
        assert_eq!(plans[0].draft, "Pricing was too low.");
    }
}
