//! Integration tests for the generate route, using the mock backend.
//!
//! Run with: cargo test --test generate

use llama_gateway::config::Settings;
use llama_gateway::services::providers::mock::MockTextProvider;
use llama_gateway::services::providers::TextProvider;
use llama_gateway::startup::{AppState, Application};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Spawn the application on a random port and return the port number.
async fn spawn_app() -> u16 {
    std::env::set_var("APP__PORT", "0");
    std::env::set_var("APP__MODEL__BACKEND", "mock");

    let settings = Settings::load().expect("Failed to load settings");
    let app = Application::build(settings)
        .await
        .expect("Failed to build application");

    let port = app.port();

    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    port
}

/// Spawn the application with a provider that fails every generation.
async fn spawn_app_with_failing_provider() -> u16 {
    let provider: Arc<dyn TextProvider> = Arc::new(MockTextProvider::disabled("mock-model"));
    let state = AppState {
        settings: Settings::default(),
        provider,
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let port = listener.local_addr().expect("Failed to read local addr").port();

    let router = Application::router(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    port
}

#[tokio::test]
async fn generate_returns_response_payload() {
    let port = spawn_app().await;
    let client = Client::new();

    let response = client
        .post(format!("http://localhost:{}/generate", port))
        .json(&serde_json::json!({"prompt": "Hello, world"}))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let text = body["response"].as_str().expect("response is not a string");
    assert!(text.starts_with("Hello, world"));
}

#[tokio::test]
async fn generated_continuation_is_bounded_by_token_cap() {
    let port = spawn_app().await;
    let client = Client::new();

    let prompt = "Once upon a time";
    let response = client
        .post(format!("http://localhost:{}/generate", port))
        .json(&serde_json::json!({"prompt": prompt}))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let text = body["response"].as_str().expect("response is not a string");

    // Total length is bounded by the input plus the 50-token generation cap.
    let prompt_words = prompt.split_whitespace().count();
    let total_words = text.split_whitespace().count();
    assert!(total_words <= prompt_words + 50);
}

#[tokio::test]
async fn generate_accepts_empty_prompt() {
    let port = spawn_app().await;
    let client = Client::new();

    let response = client
        .post(format!("http://localhost:{}/generate", port))
        .json(&serde_json::json!({"prompt": ""}))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["response"].is_string());
}

#[tokio::test]
async fn provider_fault_surfaces_as_server_error() {
    let port = spawn_app_with_failing_provider().await;
    let client = Client::new();

    let response = client
        .post(format!("http://localhost:{}/generate", port))
        .json(&serde_json::json!({"prompt": "Hello"}))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 500);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Generation error");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn generate_without_prompt_is_rejected() {
    let port = spawn_app().await;
    let client = Client::new();

    let response = client
        .post(format!("http://localhost:{}/generate", port))
        .json(&serde_json::json!({}))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 422);
}
