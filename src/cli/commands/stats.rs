//! Stats command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the stats command.
pub async fn run_stats(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let stats = orchestrator.stats().await?;

    Output::header("Recast Stats");
    Output::kv("Total processed", &stats.total_processed.to_string());
    Output::kv("This month", &stats.this_month.to_string());

    Output::header("Recent Files");
    if stats.recent.is_empty() {
        println!("  No files processed yet.");
    }
    for recent in &stats.recent {
        Output::record_info(&recent.file_name, &recent.id.to_string(), &recent.created_at);
    }

    Ok(())
}
