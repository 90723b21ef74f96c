// tests/api_tests.rs

use std::sync::Arc;

use chrono::Utc;
use hotels_api::{
    config::{Config, SanitizeConfig},
    models::hotel::{Hotel, HotelInput},
    routes,
    sanitize::{HtmlSanitizer, MemoryAuditSink},
    state::AppState,
};
use serde_json::{Value, json};
use uuid::Uuid;

fn test_config() -> Config {
    Config {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        rust_log: "error".to_string(),
        log_dir: "logs".to_string(),
        cors_allowed_origins: vec!["http://localhost:3000".to_string()],
        sanitize: SanitizeConfig::default(),
    }
}

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_with(state: AppState) -> String {
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn spawn_app() -> String {
    let state = AppState::new(test_config()).expect("Failed to build app state");
    spawn_with(state).await
}

fn hotel_payload() -> Value {
    json!({
        "name": "<b>Grand</b><script>alert(1)</script>",
        "description": "<p onclick=\"steal()\">Sea view</p>",
        "address": "1 Ocean Drive",
        "city": "Lisbon",
        "rating": 4.5,
        "has_wifi": true,
        "facilities": [
            { "type": "POOL", "short_description": "<img src=x onerror=alert(1)>" },
            { "type": "GYM", "short_description": null }
        ]
    })
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(&format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn create_hotel_sanitizes_nested_payload() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .post(&format!("{}/api/v1/hotels", address))
        .json(&hotel_payload())
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "<b>Grand</b>");
    assert_eq!(body["description"], "<p>Sea view</p>");
    assert_eq!(body["address"], "1 Ocean Drive");
    assert_eq!(body["facilities"][0]["type"], "POOL");
    assert_eq!(body["facilities"][0]["short_description"], "<img src=\"x\">");
    assert_eq!(body["facilities"][1]["short_description"], Value::Null);
}

#[tokio::test]
async fn created_hotel_is_listed_and_fetchable() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let created: Value = client
        .post(&format!("{}/api/v1/hotels", address))
        .json(&hotel_payload())
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    // Act
    let list: Value = client
        .get(&format!("{}/api/v1/hotels", address))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    let fetched = client
        .get(&format!("{}/api/v1/hotels/{}", address, id))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert_eq!(list[0]["id"], created["id"]);
    assert_eq!(fetched.status().as_u16(), 200);
    let fetched: Value = fetched.json().await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn get_unknown_hotel_returns_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/v1/hotels/{}", address, Uuid::new_v4()))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn create_hotel_fails_validation() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let mut payload = hotel_payload();
    payload["rating"] = json!(7.0);

    // Act
    let response = client
        .post(&format!("{}/api/v1/hotels", address))
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn name_that_is_only_markup_fails_validation() {
    // Arrange: the name sanitizes down to an empty string
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let mut payload = hotel_payload();
    payload["name"] = json!("<script>alert(1)</script>");

    // Act
    let response = client
        .post(&format!("{}/api/v1/hotels", address))
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/api/v1/hotels", address))
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn update_and_delete_hotel() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let created: Value = client
        .post(&format!("{}/api/v1/hotels", address))
        .json(&hotel_payload())
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let mut update = hotel_payload();
    update["description"] = json!("<i>Renovated</i><iframe src=\"https://evil\"></iframe>");

    // Act
    let updated = client
        .put(&format!("{}/api/v1/hotels/{}", address, id))
        .json(&update)
        .send()
        .await
        .expect("Failed to execute request");
    let deleted = client
        .delete(&format!("{}/api/v1/hotels/{}", address, id))
        .send()
        .await
        .expect("Failed to execute request");
    let deleted_again = client
        .delete(&format!("{}/api/v1/hotels/{}", address, id))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(updated.status().as_u16(), 200);
    let updated: Value = updated.json().await.unwrap();
    assert_eq!(updated["description"], "<i>Renovated</i>");
    assert_eq!(updated["created_at"], created["created_at"]);
    assert_eq!(deleted.status().as_u16(), 204);
    assert_eq!(deleted_again.status().as_u16(), 404);
}

#[tokio::test]
async fn summaries_sanitize_names_while_serializing() {
    // Arrange: store a raw record directly, bypassing the inbound hook
    let state = AppState::new(test_config()).expect("Failed to build app state");
    let input = HotelInput {
        name: "<em>Riverside</em><script>alert(1)</script>".to_string(),
        description: None,
        address: "2 River Rd".to_string(),
        city: "<b>Porto</b>".to_string(),
        rating: Some(3.0),
        has_wifi: false,
        facilities: Vec::new(),
    };
    state
        .store
        .insert(Hotel::from_input(Uuid::new_v4(), input, Utc::now()));
    let address = spawn_with(state).await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(&format!("{}/api/v1/hotels/summaries", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body[0]["name"], "<em>Riverside</em>");
    // City is not marked for sanitization
    assert_eq!(body[0]["city"], "<b>Porto</b>");
}

#[tokio::test]
async fn out_of_scope_handlers_are_left_untouched() {
    // Arrange
    let mut config = test_config();
    config.sanitize.scope_pattern = "hotels_api::admin(::.*)?".to_string();
    let sanitizer = Arc::new(HtmlSanitizer::from_config(&config.sanitize).unwrap());
    let state = AppState::with_sanitizer(config, sanitizer.clone()).unwrap();
    let address = spawn_with(state).await;
    let client = reqwest::Client::new();

    // Act
    let body: Value = client
        .post(&format!("{}/api/v1/hotels", address))
        .json(&hotel_payload())
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(body["name"], "<b>Grand</b><script>alert(1)</script>");
    assert!(sanitizer.cache().is_empty());
}

#[tokio::test]
async fn one_audit_message_per_hook_invocation() {
    // Arrange
    let config = test_config();
    let sink = Arc::new(MemoryAuditSink::default());
    let sanitizer = Arc::new(
        HtmlSanitizer::from_config(&config.sanitize)
            .unwrap()
            .with_sink(sink.clone()),
    );
    let state = AppState::with_sanitizer(config, sanitizer).unwrap();
    let address = spawn_with(state).await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .post(&format!("{}/api/v1/hotels", address))
        .json(&hotel_payload())
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    // Assert: inbound walk reports, outbound walk sees clean values only
    let messages = sink.messages();
    assert_eq!(messages.len(), 1);
    let message = &messages[0];
    assert!(message.contains("create_hotel"));
    assert!(message.contains("hotels_api::handlers::hotels"));
    assert!(message.contains("script"));
    assert!(message.contains("p=[onclick]"));
    assert!(message.contains("img=[onerror]"));
}
