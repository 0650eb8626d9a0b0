//! Llama text provider backed by candle.
//!
//! Model artifacts come from the Hugging Face hub; weights are memory-mapped
//! and loaded once at startup with no retry.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::llama::{Cache, Config, Llama, LlamaConfig, LlamaEosToks};
use hf_hub::api::sync::{Api, ApiError, ApiRepo};
use tokenizers::Tokenizer;
use tokio::sync::Semaphore;

use super::{GenerationParams, ProviderError, ProviderResponse, TextProvider};

const EOS_TOKEN: &str = "</s>";

/// Tokenizer, weights and device bundled for synchronous generation.
pub struct LlamaEngine {
    model_id: String,
    tokenizer: Tokenizer,
    model: Llama,
    config: Config,
    device: Device,
    dtype: DType,
}

impl LlamaEngine {
    /// Resolve the model through the hub cache and load it onto the best
    /// available device. Blocking; call from a blocking context.
    pub fn load(model_id: &str) -> Result<Self, ProviderError> {
        let api = Api::new().map_err(|e| ProviderError::Fetch(e.to_string()))?;
        let repo = api.model(model_id.to_string());

        let tokenizer_path = fetch(&repo, model_id, "tokenizer.json")?;
        let config_path = fetch(&repo, model_id, "config.json")?;
        let weight_paths = fetch_weights(&repo, model_id)?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ProviderError::Tokenizer(e.to_string()))?;

        let config_file =
            File::open(&config_path).map_err(|e| ProviderError::Fetch(e.to_string()))?;
        let llama_config: LlamaConfig = serde_json::from_reader(config_file)
            .map_err(|e| ProviderError::Fetch(format!("invalid model config: {e}")))?;
        let config = llama_config.into_config(false);

        let device = Device::cuda_if_available(0).map_err(inference_err)?;
        let dtype = if device.is_cuda() {
            DType::F16
        } else {
            DType::F32
        };

        tracing::info!(
            model = %model_id,
            shards = weight_paths.len(),
            device = ?device,
            "Loading model weights"
        );

        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&weight_paths, dtype, &device) }
            .map_err(inference_err)?;
        let model = Llama::load(vb, &config).map_err(inference_err)?;

        Ok(Self {
            model_id: model_id.to_string(),
            tokenizer,
            model,
            config,
            device,
            dtype,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Tokenize the prompt, sample up to `max_new_tokens` continuations and
    /// decode the full sequence. Compute-bound; does not yield.
    pub fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| ProviderError::Tokenizer(e.to_string()))?;
        let mut tokens: Vec<u32> = encoding.get_ids().to_vec();
        let prompt_tokens = tokens.len();

        let eos_token_id = self
            .config
            .eos_token_id
            .clone()
            .or_else(|| self.tokenizer.token_to_id(EOS_TOKEN).map(LlamaEosToks::Single));

        // KV cache is per call; the model itself is shared read-only across
        // requests.
        let mut cache =
            Cache::new(true, self.dtype, &self.config, &self.device).map_err(inference_err)?;
        let mut logits_processor =
            LogitsProcessor::new(params.seed, params.temperature, params.top_p);

        let mut index_pos = 0;
        let mut generated = 0;
        while generated < params.max_new_tokens {
            let (ctx, ctx_index) = if index_pos > 0 {
                (&tokens[tokens.len() - 1..], index_pos)
            } else {
                (&tokens[..], 0)
            };
            let input = Tensor::new(ctx, &self.device)
                .map_err(inference_err)?
                .unsqueeze(0)
                .map_err(inference_err)?;
            let logits = self
                .model
                .forward(&input, ctx_index, &mut cache)
                .map_err(inference_err)?
                .squeeze(0)
                .map_err(inference_err)?;
            index_pos += ctx.len();

            let next = logits_processor.sample(&logits).map_err(inference_err)?;
            tokens.push(next);
            generated += 1;

            match eos_token_id {
                Some(LlamaEosToks::Single(id)) if next == id => break,
                Some(LlamaEosToks::Multiple(ref ids)) if ids.contains(&next) => break,
                _ => {}
            }
        }

        let text = self
            .tokenizer
            .decode(&tokens, true)
            .map_err(|e| ProviderError::Tokenizer(e.to_string()))?;

        Ok(ProviderResponse {
            text,
            prompt_tokens,
            generated_tokens: generated,
        })
    }
}

fn inference_err(err: candle_core::Error) -> ProviderError {
    ProviderError::Inference(err.to_string())
}

fn fetch(repo: &ApiRepo, model_id: &str, file: &str) -> Result<PathBuf, ProviderError> {
    repo.get(file).map_err(|e| classify_hub_error(model_id, e))
}

/// A 404 from the hub means the repo or file does not exist; everything else
/// (network, auth, disk) stays a plain fetch failure.
fn classify_hub_error(model_id: &str, err: ApiError) -> ProviderError {
    let msg = err.to_string();
    if msg.contains("404") || msg.contains("Not Found") {
        ProviderError::ModelNotFound(model_id.to_string())
    } else {
        ProviderError::Fetch(msg)
    }
}

/// Single-file checkpoints ship as model.safetensors; larger ones are sharded
/// behind model.safetensors.index.json.
fn fetch_weights(repo: &ApiRepo, model_id: &str) -> Result<Vec<PathBuf>, ProviderError> {
    if let Ok(single) = repo.get("model.safetensors") {
        return Ok(vec![single]);
    }

    let index_path = fetch(repo, model_id, "model.safetensors.index.json")?;
    let index_file = File::open(&index_path).map_err(|e| ProviderError::Fetch(e.to_string()))?;
    let index: serde_json::Value = serde_json::from_reader(index_file)
        .map_err(|e| ProviderError::Fetch(format!("invalid safetensors index: {e}")))?;

    let weight_map = index
        .get("weight_map")
        .and_then(|v| v.as_object())
        .ok_or_else(|| {
            ProviderError::Fetch(format!("malformed safetensors index for {model_id}"))
        })?;
    let files: BTreeSet<&str> = weight_map.values().filter_map(|v| v.as_str()).collect();

    files
        .into_iter()
        .map(|file| fetch(repo, model_id, file))
        .collect()
}

/// Async provider wrapping [`LlamaEngine`].
///
/// Generation is compute-bound, so each call takes a semaphore permit and
/// runs on the blocking thread pool instead of the async executor. The
/// permit count bounds how many generations run at once.
pub struct LlamaTextProvider {
    engine: Arc<LlamaEngine>,
    permits: Arc<Semaphore>,
}

impl LlamaTextProvider {
    pub fn new(engine: LlamaEngine, max_concurrency: usize) -> Self {
        Self {
            engine: Arc::new(engine),
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }
}

#[async_trait]
impl TextProvider for LlamaTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ProviderError::Inference("generation queue closed".to_string()))?;

        let engine = self.engine.clone();
        let prompt = prompt.to_string();
        let params = params.clone();
        tokio::task::spawn_blocking(move || engine.generate(&prompt, &params))
            .await
            .map_err(|e| ProviderError::Inference(format!("generation task failed: {e}")))?
    }

    fn model_id(&self) -> &str {
        self.engine.model_id()
    }
}
