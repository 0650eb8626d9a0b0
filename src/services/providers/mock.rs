//! Mock provider implementation for testing.

use async_trait::async_trait;

use super::{GenerationParams, ProviderError, ProviderResponse, TextProvider};

/// Deterministic stand-in for the Llama backend.
///
/// When enabled it echoes the prompt followed by a continuation of at most
/// `max_new_tokens` words, so tests can assert the structural token cap
/// without loading weights. A disabled mock fails every call, for exercising
/// the fault path.
pub struct MockTextProvider {
    model_id: String,
    enabled: bool,
}

impl MockTextProvider {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            enabled: true,
        }
    }

    /// A mock whose every generation fails.
    pub fn disabled(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            enabled: false,
        }
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        // Simulate some processing
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        let generated_tokens = params.max_new_tokens.min(8);
        let continuation = vec!["lorem"; generated_tokens].join(" ");
        let text = if prompt.is_empty() {
            continuation
        } else {
            format!("{prompt} {continuation}")
        };

        Ok(ProviderResponse {
            text,
            prompt_tokens: prompt.split_whitespace().count(),
            generated_tokens,
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn continuation_is_bounded_by_token_cap() {
        let provider = MockTextProvider::new("mock-model");
        let params = GenerationParams {
            max_new_tokens: 3,
            ..GenerationParams::default()
        };

        let response = provider.generate("Hello there", &params).await.unwrap();

        assert!(response.text.starts_with("Hello there"));
        assert!(response.generated_tokens <= 3);
    }

    #[tokio::test]
    async fn disabled_mock_fails_every_call() {
        let provider = MockTextProvider::disabled("mock-model");
        let params = GenerationParams::default();

        let err = provider.generate("Hello", &params).await.unwrap_err();

        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }
}
