//! OpenAI chat completion generator.

use super::{GenerationRequest, Generator};
use crate::error::{RecastError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Rewrites drafts with an OpenAI chat model.
pub struct OpenAIGenerator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIGenerator {
    /// Create a new generator with the given model and request timeout.
    pub fn new(model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(timeout)?,
            model: model.to_string(),
        })
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip_all, fields(kind = %request.kind, model = %self.model))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.clone())
                .build()
                .map_err(|e| RecastError::Generation(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user.clone())
                .build()
                .map_err(|e| RecastError::Generation(e.to_string()))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .build()
            .map_err(|e| RecastError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| RecastError::OpenAI(format!("Failed to generate {}: {}", request.kind, e)))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| RecastError::Generation("Empty response from LLM".to_string()))?;

        debug!("Generated {} chars", text.len());
        Ok(text)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
