//! Orchestrator for Recast.
//!
//! Accepts a transcript, runs the pipeline to completion, and persists the
//! result exactly once. Nothing is persisted for an empty, failed or
//! cancelled submission.

use crate::config::{Prompts, Settings};
use crate::diagnostics::Diagnostic;
use crate::error::{RecastError, Result};
use crate::generation::{create_generator, Generator};
use crate::pipeline::{Pipeline, PipelineConfig, PipelineState};
use crate::store::{create_store, parse_id, NewRecord, RecordStore, Stats, StoredRecord};
use crate::transcript::Transcript;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// The main orchestrator.
pub struct Orchestrator {
    settings: Settings,
    pipeline: Pipeline,
    store: Arc<dyn RecordStore>,
}

impl Orchestrator {
    /// Create an orchestrator from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let generator = create_generator(&settings.generation)?;
        info!("Using {} generation", generator.name());

        let store = create_store(&settings)?;

        Ok(Self::with_components(settings, prompts, generator, store))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        generator: Arc<dyn Generator>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        let pipeline = Pipeline::new(
            PipelineConfig::from_settings(&settings),
            generator,
            Arc::new(prompts),
        );
        Self {
            settings,
            pipeline,
            store,
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the record store.
    pub fn store(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }

    /// Process and persist a transcript.
    pub async fn submit(&self, text: &str, file_name: &str) -> Result<Submission> {
        self.submit_with_cancel(text, file_name, &CancellationToken::new())
            .await
    }

    /// Process and persist a transcript, stopping early if `cancel` fires.
    #[instrument(skip(self, text, cancel), fields(chars = text.len()))]
    pub async fn submit_with_cancel(
        &self,
        text: &str,
        file_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Submission> {
        let transcript = Transcript::new(text, file_name);
        if transcript.is_blank() {
            return Err(RecastError::EmptyInput);
        }

        let outcome = self.pipeline.run(&transcript, cancel).await?;
        if cancel.is_cancelled() {
            return Err(RecastError::Cancelled);
        }

        for diagnostic in outcome.run.diagnostics() {
            warn!("{}", diagnostic);
        }

        let record = self
            .store
            .save(NewRecord {
                file_name: transcript.file_name().to_string(),
                original_transcript: transcript.raw_text().to_string(),
                processed_data: outcome.result.to_data(),
                created_at: transcript.received_at_time(),
            })
            .await?;

        info!("Saved {} as {}", record.file_name, record.id);
        Ok(Submission {
            id: record.id.to_string(),
            state: outcome.run.state(),
            diagnostics: outcome.run.into_diagnostics(),
            record,
        })
    }

    /// Get a stored record by id.
    pub async fn get(&self, id: &str) -> Result<StoredRecord> {
        let id = parse_id(id)?;
        self.store.get_by_id(&id).await
    }

    /// All stored records, newest first.
    pub async fn history(&self) -> Result<Vec<StoredRecord>> {
        self.store.list_all().await
    }

    /// Totals and recent activity.
    pub async fn stats(&self) -> Result<Stats> {
        let records = self.store.list_all().await?;
        Ok(Stats::from_records(&records, Utc::now()))
    }
}

/// A persisted submission.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub id: String,
    pub state: PipelineState,
    pub diagnostics: Vec<Diagnostic>,
    pub record: StoredRecord,
}
