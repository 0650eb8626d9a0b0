//! HTTP handlers for the gateway.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::providers::GenerationParams;
use crate::startup::AppState;

pub const HOME_MESSAGE: &str = "Llama 2 Integration Successful!";

#[derive(Serialize)]
pub struct HomeResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub response: String,
}

/// Fixed acknowledgment that the model integration came up. Stateless and
/// side-effect free.
pub async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: HOME_MESSAGE.to_string(),
    })
}

/// Generate a continuation for the prompt in the request body.
///
/// Provider faults are not mapped to client-facing codes; they surface as a
/// generic 500 via [`AppError`].
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let params = GenerationParams {
        max_new_tokens: state.settings.generation.max_new_tokens,
        temperature: state.settings.generation.temperature,
        top_p: state.settings.generation.top_p,
        seed: state.settings.generation.seed,
    };

    let outcome = state.provider.generate(&request.prompt, &params).await?;
    tracing::info!(
        model = %state.provider.model_id(),
        prompt_tokens = outcome.prompt_tokens,
        generated_tokens = outcome.generated_tokens,
        "Generation complete"
    );

    Ok(Json(GenerateResponse {
        response: outcome.text,
    }))
}
