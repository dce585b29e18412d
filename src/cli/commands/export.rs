//! Export command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::content::{Section, SectionKey};
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Run the export command.
///
/// Without a section the complete processed JSON is written. With a section its
/// entries are written as plain text; when `output` is a directory, one file per
/// entry is written there.
pub async fn run_export(
    id: &str,
    section: Option<SectionKey>,
    output: Option<String>,
    settings: Settings,
) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let record = orchestrator.get(id).await?;

    let Some(key) = section else {
        let json = serde_json::to_string_pretty(&record.processed_data)?;
        match output {
            Some(path) if path != "-" => {
                let target = if Path::new(&path).is_dir() {
                    Path::new(&path).join(complete_file_name(&record.file_name))
                } else {
                    PathBuf::from(&path)
                };
                std::fs::write(&target, &json)?;
                Output::success(&format!(
                    "Exported '{}' to {}",
                    record.file_name,
                    target.display()
                ));
            }
            _ => println!("{}", json),
        }
        return Ok(());
    };

    let data = record.processed_data.section(key);
    if data.is_empty() {
        Output::warning(&format!("'{}' has no {} to export.", record.file_name, key));
        return Ok(());
    }

    match output {
        Some(path) if Path::new(&path).is_dir() => {
            let files = item_files(Path::new(&path), &record.file_name, key, data);
            for (file, text) in &files {
                std::fs::write(file, text)?;
            }
            Output::success(&format!("Exported {} {} file(s) to {}", files.len(), key, path));
        }
        Some(path) if path != "-" => {
            std::fs::write(&path, section_text(&data.entries(key)))?;
            Output::success(&format!("Exported {} of '{}' to {}", key, record.file_name, path));
        }
        _ => println!("{}", section_text(&data.entries(key))),
    }

    Ok(())
}

/// Name of the complete JSON download.
pub fn complete_file_name(file_name: &str) -> String {
    format!("{}-complete.json", file_name)
}

/// Plain text of a section: each entry is its title line followed by its content.
pub fn section_text(entries: &[(String, String)]) -> String {
    entries
        .iter()
        .map(|(title, content)| format!("{}\n\n{}", title, content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Per-entry files `<file_name>-<section>-<n>.txt` holding the entry content.
/// A string section is a single `<file_name>-<section>.txt`.
pub fn item_files(
    dir: &Path,
    file_name: &str,
    key: SectionKey,
    section: &Section,
) -> Vec<(PathBuf, String)> {
    match section {
        Section::Text(text) => vec![(
            dir.join(format!("{}-{}.txt", file_name, key)),
            text.trim().to_string(),
        )],
        Section::Items(items) => items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.content.trim().is_empty())
            .map(|(i, item)| {
                (
                    dir.join(format!("{}-{}-{}.txt", file_name, key, i + 1)),
                    item.content.trim().to_string(),
                )
            })
            .collect(),
    }
}
