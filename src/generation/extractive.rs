//! Offline generator that publishes the extractive draft unchanged.

use super::{GenerationRequest, Generator};
use crate::error::Result;
use async_trait::async_trait;

/// Returns the draft as is, so every output is literal transcript text.
#[derive(Debug, Clone, Default)]
pub struct ExtractiveGenerator;

impl ExtractiveGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Generator for ExtractiveGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        Ok(request.draft.trim().to_string())
    }

    fn name(&self) -> &str {
        "extractive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationKind;

    #[tokio::test]
    async fn test_returns_draft() {
        let generator = ExtractiveGenerator::new();
        let request = GenerationRequest::new(GenerationKind::Chapter, "\nOur own words.\n")
            .with_prompts("system", "user");
        assert_eq!(generator.generate(&request).await.unwrap(), "Our own words.");
    }
}
