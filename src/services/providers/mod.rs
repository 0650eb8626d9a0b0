//! Text-generation provider abstractions and implementations.
//!
//! A trait-based seam between the HTTP surface and the inference backend,
//! allowing the local Llama engine to be swapped for a mock in tests.

pub mod llama;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("failed to fetch model artifacts: {0}")]
    Fetch(String),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("inference error: {0}")]
    Inference(String),
}

/// Parameters controlling a single generation.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Cap on newly produced tokens.
    pub max_new_tokens: usize,
    /// Sampling temperature; `None` selects greedy decoding.
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub seed: u64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams {
            max_new_tokens: 50,
            temperature: None,
            top_p: None,
            seed: 299792458,
        }
    }
}

/// Result of a provider generation.
#[derive(Debug)]
pub struct ProviderResponse {
    /// Decoded text: the prompt followed by its continuation, with special
    /// tokens dropped.
    pub text: String,

    /// Tokens in the encoded prompt.
    pub prompt_tokens: usize,

    /// Newly produced tokens.
    pub generated_tokens: usize,
}

/// Trait for causal-LM text generation backends.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate a continuation for the prompt.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Identifier of the model being served.
    fn model_id(&self) -> &str;
}
