//! List command implementation.

use crate::cli::{content_preview, Output};
use crate::content::SectionKey;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Characters of the leading insight shown per record.
const PREVIEW_CHARS: usize = 60;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    match orchestrator.history().await {
        Ok(records) => {
            if records.is_empty() {
                Output::info("No transcripts processed yet. Use 'recast process <file>' to add one.");
            } else {
                Output::header(&format!("Processed Transcripts ({})", records.len()));
                println!();

                for record in &records {
                    Output::record_info(&record.file_name, &record.id.to_string(), &record.created_at);
                    let insights = record.processed_data.insights.entries(SectionKey::Insights);
                    if let Some((title, _)) = insights.first() {
                        Output::list_item(&content_preview(title, PREVIEW_CHARS));
                    }
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list transcripts: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
