//! OpenAI client configuration with sensible defaults.

use crate::error::{RecastError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(OpenAIConfig::default()).with_http_client(http_client))
}

/// Check if the OpenAI API key is configured.
pub fn is_api_key_configured() -> bool {
    std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.trim().is_empty())
}

/// Fail early when the API key is missing.
pub fn require_api_key() -> Result<()> {
    if is_api_key_configured() {
        Ok(())
    } else {
        Err(RecastError::Config(
            "OPENAI_API_KEY is not set. Export it or use generation.provider = \"extractive\"."
                .to_string(),
        ))
    }
}
