//! Show command implementation.

use crate::cli::{format_timestamp, Output};
use crate::config::Settings;
use crate::content::{ProcessedData, SectionKey};
use crate::error::RecastError;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Shown for a section without content.
pub const EMPTY_SECTION: &str = "No content available for this section";

/// Run the show command.
pub async fn run_show(id: &str, section: Option<SectionKey>, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let record = match orchestrator.get(id).await {
        Ok(record) => record,
        Err(RecastError::NotFound(_)) => {
            Output::error(&format!("No processed transcript found with ID: {}", id));
            Output::info("Use 'recast list' to see processed transcripts.");
            return Err(RecastError::NotFound(id.to_string()).into());
        }
        Err(e) => return Err(e.into()),
    };

    Output::header(&record.file_name);
    Output::kv("ID", &record.id.to_string());
    Output::kv("Processed", &format_timestamp(&record.created_at));

    let keys: Vec<SectionKey> = match section {
        Some(key) => vec![key],
        None => SectionKey::ALL.to_vec(),
    };

    for key in keys {
        Output::header(key.label());
        let entries = section_entries(&record.processed_data, key);
        if entries.is_empty() {
            println!("  {}", EMPTY_SECTION);
            continue;
        }
        for (title, content) in entries {
            Output::section_item(&title, &content);
        }
    }

    Ok(())
}

/// Titled entries of a section; untitled items are named `"<section> N"`.
pub fn section_entries(data: &ProcessedData, key: SectionKey) -> Vec<(String, String)> {
    data.section(key)
        .entries(key)
        .into_iter()
        .filter(|(_, content)| !content.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Section, SectionItem};

    #[test]
    fn test_section_entries() {
        let data = ProcessedData {
            social: Section::Items(vec![
                SectionItem {
                    title: None,
                    content: "First post".to_string(),
                },
                SectionItem {
                    title: None,
                    content: "  ".to_string(),
                },
            ]),
            ..Default::default()
        };

        assert_eq!(
            section_entries(&data, SectionKey::Social),
            vec![("social 1".to_string(), "First post".to_string())]
        );
        assert!(section_entries(&data, SectionKey::Blogs).is_empty());
    }
}
