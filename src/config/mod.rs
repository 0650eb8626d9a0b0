use config::{Config as Cfg, File};
use serde::Deserialize;

use crate::error::AppError;

/// Application settings, loaded once at startup and immutable afterwards.
///
/// Every field has a compiled-in default; missing configuration keys fall
/// back silently instead of erroring.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub generation: GenerationSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelSettings {
    #[serde(default = "default_backend")]
    pub backend: Backend,
    /// Hugging Face hub id of the causal LM to serve.
    #[serde(default = "default_model_id")]
    pub id: String,
}

/// Which text provider to construct at startup.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Llama,
    Mock,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationSettings {
    /// Cap on newly produced tokens per request.
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: usize,
    /// Sampling temperature; `None` means greedy decoding.
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Number of generations allowed to run on the blocking pool at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_app_name() -> String {
    "My FastAPI App".to_string()
}

fn default_admin_email() -> String {
    "admin@example.com".to_string()
}

fn default_database_url() -> String {
    "sqlite:///./test.db".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_backend() -> Backend {
    Backend::Llama
}

fn default_model_id() -> String {
    "meta-llama/Llama-2-7b-chat-hf".to_string()
}

fn default_max_new_tokens() -> usize {
    50
}

fn default_seed() -> u64 {
    299792458
}

fn default_max_concurrency() -> usize {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            app_name: default_app_name(),
            admin_email: default_admin_email(),
            database_url: default_database_url(),
            port: default_port(),
            model: ModelSettings::default(),
            generation: GenerationSettings::default(),
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        ModelSettings {
            backend: default_backend(),
            id: default_model_id(),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        GenerationSettings {
            max_new_tokens: default_max_new_tokens(),
            temperature: None,
            top_p: None,
            seed: default_seed(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
