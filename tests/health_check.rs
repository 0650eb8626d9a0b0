//! Integration tests for the gateway's health route.
//!
//! These tests run against the mock backend; no model weights are needed.
//! Run with: cargo test --test health_check

use llama_gateway::config::Settings;
use llama_gateway::startup::Application;
use reqwest::Client;
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

#[tokio::test]
async fn home_returns_success_message() {
    let port = spawn_app().await;
    let client = Client::new();

    let response = client
        .get(format!("http://localhost:{}/", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(
        body,
        serde_json::json!({"message": "Llama 2 Integration Successful!"})
    );
}

#[tokio::test]
async fn home_is_idempotent() {
    let port = spawn_app().await;
    let client = Client::new();

    let mut bodies = Vec::new();
    for _ in 0..3 {
        let response = client
            .get(format!("http://localhost:{}/", port))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(response.status().as_u16(), 200);
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        bodies.push(body);
    }

    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[1], bodies[2]);
}
