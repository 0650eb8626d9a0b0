//! Convenience pipeline bundling tokenizer, model and decoding into a single
//! callable, for one-shot generation outside the server.

use super::providers::llama::LlamaEngine;
use super::providers::{GenerationParams, ProviderError};

pub struct TextGenerationPipeline {
    engine: LlamaEngine,
    params: GenerationParams,
}

impl TextGenerationPipeline {
    /// Load the pipeline for a hub model id. Blocking.
    pub fn from_pretrained(model_id: &str) -> Result<Self, ProviderError> {
        let engine = LlamaEngine::load(model_id)?;
        Ok(Self {
            engine,
            params: GenerationParams::default(),
        })
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn model_id(&self) -> &str {
        self.engine.model_id()
    }

    /// Run one generation over the prompt and return the decoded text.
    pub fn run(&self, prompt: &str) -> Result<String, ProviderError> {
        Ok(self.engine.generate(prompt, &self.params)?.text)
    }
}
