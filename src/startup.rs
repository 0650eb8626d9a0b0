//! Application startup and lifecycle management.
//!
//! The model is loaded exactly once here and handed to request handlers
//! through [`AppState`]; nothing else holds process-wide state.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::{Backend, Settings};
use crate::error::AppError;
use crate::handlers;
use crate::services::providers::llama::{LlamaEngine, LlamaTextProvider};
use crate::services::providers::mock::MockTextProvider;
use crate::services::providers::TextProvider;

/// Shared application state, constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub provider: Arc<dyn TextProvider>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application: construct the text provider (fatal on failure,
    /// no retry) and bind the listener. Port 0 picks a random port for tests.
    pub async fn build(settings: Settings) -> Result<Self, AppError> {
        let provider: Arc<dyn TextProvider> = match settings.model.backend {
            Backend::Llama => {
                let model_id = settings.model.id.clone();
                tracing::info!(model = %model_id, "Loading tokenizer and model");
                let engine = tokio::task::spawn_blocking(move || LlamaEngine::load(&model_id))
                    .await
                    .map_err(|e| {
                        AppError::InternalError(anyhow::anyhow!("model load task failed: {e}"))
                    })??;
                Arc::new(LlamaTextProvider::new(
                    engine,
                    settings.generation.max_concurrency,
                ))
            }
            Backend::Mock => Arc::new(MockTextProvider::new(settings.model.id.clone())),
        };
        tracing::info!(model = %provider.model_id(), "Text provider initialized");

        let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        let state = AppState { settings, provider };

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Build the request router over the given state.
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/", get(handlers::home))
            .route("/generate", post(handlers::generate))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Run the HTTP server until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = Self::router(self.state);
        tracing::info!("HTTP server listening on port {}", self.port);
        axum::serve(self.listener, router).await
    }
}
