//! Text generation backends.
//!
//! Every stage first assembles a draft from the speaker's own sentences, then
//! hands it to a [`Generator`]. The extractive backend returns the draft as is;
//! the OpenAI backend rewrites it under the stage's prompt.

mod extractive;
mod openai;

pub use extractive::ExtractiveGenerator;
pub use openai::OpenAIGenerator;

use crate::config::{GenerationProvider, GenerationSettings};
use crate::error::{RecastError, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// What is being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Insight,
    Chapter,
    Blog,
    Social,
}

impl std::fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationKind::Insight => write!(f, "insight"),
            GenerationKind::Chapter => write!(f, "chapter"),
            GenerationKind::Blog => write!(f, "blog"),
            GenerationKind::Social => write!(f, "social"),
        }
    }
}

/// A single generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    /// Rendered system prompt.
    pub system: String,
    /// Rendered user prompt.
    pub user: String,
    /// Draft assembled from the transcript.
    pub draft: String,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(kind: GenerationKind, draft: impl Into<String>) -> Self {
        Self {
            kind,
            system: String::new(),
            user: String::new(),
            draft: draft.into(),
            temperature: 0.0,
        }
    }

    pub fn with_prompts(mut self, system: impl Into<String>, user: impl Into<String>) -> Self {
        self.system = system.into();
        self.user = user.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }
}

/// Trait for text generation backends.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce text for a request. Never returns blank text.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Backend name for logs.
    fn name(&self) -> &str;
}

/// Generate with bounded retries on failure.
pub async fn generate_with_retry(
    generator: &dyn Generator,
    request: &GenerationRequest,
    retries: u32,
) -> Result<String> {
    let mut attempt = 0;
    loop {
        match generator.generate(request).await {
            Ok(text) if !text.trim().is_empty() => return Ok(text.trim().to_string()),
            Ok(_) => {
                if attempt >= retries {
                    return Err(RecastError::Generation(format!(
                        "{} returned an empty {}",
                        generator.name(),
                        request.kind
                    )));
                }
            }
            Err(e) => {
                if attempt >= retries {
                    return Err(e);
                }
                warn!(
                    "{} {} generation failed (attempt {}), retrying: {}",
                    generator.name(),
                    request.kind,
                    attempt + 1,
                    e
                );
            }
        }
        attempt += 1;
    }
}

/// Run requests with a concurrency limit; results come back in request order.
///
/// Individual failures are returned in place. Cancellation aborts the batch.
pub async fn generate_all(
    generator: &dyn Generator,
    requests: &[GenerationRequest],
    retries: u32,
    max_concurrent: usize,
    cancel: &CancellationToken,
) -> Result<Vec<Result<String>>> {
    let mut results: Vec<(usize, Result<String>)> = Vec::with_capacity(requests.len());

    let pending: Vec<_> = requests
        .iter()
        .enumerate()
        .map(|(idx, request)| async move {
            (idx, generate_with_retry(generator, request, retries).await)
        })
        .collect();
    let mut stream = stream::iter(pending).buffer_unordered(max_concurrent.max(1));

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RecastError::Cancelled),
            next = stream.next() => match next {
                Some(item) => results.push(item),
                None => break,
            },
        }
    }

    results.sort_by_key(|(idx, _)| *idx);
    Ok(results.into_iter().map(|(_, r)| r).collect())
}

/// Create a generator from settings.
pub fn create_generator(settings: &GenerationSettings) -> Result<Arc<dyn Generator>> {
    match settings.provider {
        GenerationProvider::Extractive => Ok(Arc::new(ExtractiveGenerator::new())),
        GenerationProvider::OpenAI => {
            crate::openai::require_api_key()?;
            let generator = OpenAIGenerator::new(
                &settings.model,
                Duration::from_secs(settings.request_timeout_seconds),
            )?;
            info!("Generating with OpenAI model {}", generator.model());
            Ok(Arc::new(generator))
        }
    }
}
