//! Process command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::content::SectionKey;
use crate::error::RecastError;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// File extensions accepted as transcripts.
const ACCEPTED_EXTENSIONS: &[&str] = &["txt", "md"];

/// Run the process command.
pub async fn run_process(file: &str, json: bool, settings: Settings) -> Result<()> {
    let path = Path::new(file);
    if let Err(e) = validate_upload(path) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let text = std::fs::read_to_string(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string());

    let orchestrator = Orchestrator::new(settings)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let spinner = Output::spinner(&format!("Processing {}...", file_name));
    let result = orchestrator.submit_with_cancel(&text, &file_name, &cancel).await;
    spinner.finish_and_clear();

    let submission = match result {
        Ok(submission) => submission,
        Err(RecastError::Cancelled) => {
            Output::warning("Processing cancelled. Nothing was saved.");
            return Ok(());
        }
        Err(e) => {
            Output::error(&format!("Processing failed: {}", e));
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&submission)?);
        return Ok(());
    }

    Output::success(&format!("Processed '{}'", file_name));
    Output::kv("ID", &submission.id);
    for key in SectionKey::ALL {
        let count = submission.record.processed_data.section(key).len();
        Output::kv(key.label(), &count.to_string());
    }

    if !submission.diagnostics.is_empty() {
        Output::warning(&format!("{} section(s) incomplete:", submission.diagnostics.len()));
        for diagnostic in &submission.diagnostics {
            Output::diagnostic(diagnostic);
        }
    }

    println!();
    Output::info(&format!("Use 'recast show {}' to read the result.", submission.id));

    Ok(())
}

/// Accept only existing `.txt` and `.md` files.
pub fn validate_upload(path: &Path) -> crate::error::Result<()> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(RecastError::InvalidInput(format!(
            "Unsupported file type: {}. Please upload a .txt or .md file.",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(RecastError::InvalidInput(format!(
            "File not found: {}",
            path.display()
        )));
    }
    Ok(())
}
