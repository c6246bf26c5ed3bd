mod common;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn chat_crud_flow() {
    let app = common::spawn_app().await;
    let client = reqwest::Client::new();
    let cookie = common::login(&app).await;

    // Create
    let response = client
        .post(format!("{}/chat", app.address))
        .header("Cookie", &cookie)
        .json(&json!({ "title": "Trip planning" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("invalid json");
    let chat_id = body["id"].as_str().expect("no chat id").to_string();

    // List
    let response = client
        .get(format!("{}/chat", app.address))
        .header("Cookie", &cookie)
        .send()
        .await
        .expect("Failed to execute request.");
    let body: serde_json::Value = response.json().await.expect("invalid json");
    let list = body["list"].as_array().expect("no list");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "Trip planning");

    // Rename
    let response = client
        .put(format!("{}/chat/{}", app.address, chat_id))
        .header("Cookie", &cookie)
        .json(&json!({ "title": "Holiday" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("invalid json");
    assert_eq!(body["item"]["title"], "Holiday");

    // Fetch with transcript
    let response = client
        .get(format!("{}/chat/{}", app.address, chat_id))
        .header("Cookie", &cookie)
        .send()
        .await
        .expect("Failed to execute request.");
    let body: serde_json::Value = response.json().await.expect("invalid json");
    assert_eq!(body["item"]["title"], "Holiday");
    assert_eq!(body["item"]["messages"].as_array().expect("no messages").len(), 0);

    // Delete, then the chat is gone
    let response = client
        .delete(format!("{}/chat/{}", app.address, chat_id))
        .header("Cookie", &cookie)
        .send()
        .await
        .expect("Failed to execute request.");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/chat/{}", app.address, chat_id))
        .header("Cookie", &cookie)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn chat_title_is_capped_at_fifty_chars() {
    let app = common::spawn_app().await;
    let client = reqwest::Client::new();
    let cookie = common::login(&app).await;

    let response = client
        .post(format!("{}/chat", app.address))
        .header("Cookie", &cookie)
        .json(&json!({ "title": "x".repeat(51) }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn empty_model_override_is_rejected() {
    let app = common::spawn_app().await;
    let client = reqwest::Client::new();
    let cookie = common::login(&app).await;

    let response = client
        .post(format!("{}/chat", app.address))
        .header("Cookie", &cookie)
        .json(&json!({ "title": "Picky" }))
        .send()
        .await
        .expect("Failed to execute request.");
    let body: serde_json::Value = response.json().await.expect("invalid json");
    let chat_id = body["id"].as_str().expect("no chat id").to_string();

    // An empty override never reaches the inference server.
    let response = client
        .post(format!("{}/chat/{}/messages", app.address, chat_id))
        .header("Cookie", &cookie)
        .json(&json!({ "content": "Hi!", "model": "" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn users_cannot_see_each_others_chats() {
    let app = common::spawn_app().await;
    let client = reqwest::Client::new();
    let cookie = common::login(&app).await;

    let response = client
        .post(format!("{}/chat", app.address))
        .header("Cookie", &cookie)
        .json(&json!({ "title": "Private" }))
        .send()
        .await
        .expect("Failed to execute request.");
    let body: serde_json::Value = response.json().await.expect("invalid json");
    let chat_id = body["id"].as_str().expect("no chat id").to_string();

    client
        .post(format!("{}/auth/register", app.address))
        .json(&json!({
            "username": "second",
            "name": "Second User",
            "email": "second@example.com",
            "password": "a long password"
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    let other_cookie = common::login_as(&app, "second", "a long password").await;

    let response = client
        .get(format!("{}/chat/{}", app.address, chat_id))
        .header("Cookie", &other_cookie)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .delete(format!("{}/chat/{}", app.address, chat_id))
        .header("Cookie", &other_cookie)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn message_streams_fragments_and_persists_the_reply() {
    let inference = MockServer::start().await;
    let ndjson = concat!(
        r#"{"message":{"role":"assistant","content":"Hello "},"done":false}"#,
        "\n",
        r#"{"message":{"role":"assistant","content":"there"},"done":false}"#,
        "\n",
        r#"{"done":true}"#,
        "\n",
    );
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({ "model": "llama3.1", "stream": true })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ndjson, "application/x-ndjson"))
        .mount(&inference)
        .await;

    let app = common::spawn_app_with_inference(&inference.uri()).await;
    let client = reqwest::Client::new();
    let cookie = common::login(&app).await;

    let response = client
        .post(format!("{}/chat", app.address))
        .header("Cookie", &cookie)
        .json(&json!({ "title": "Greetings" }))
        .send()
        .await
        .expect("Failed to execute request.");
    let body: serde_json::Value = response.json().await.expect("invalid json");
    let chat_id = body["id"].as_str().expect("no chat id").to_string();

    let response = client
        .post(format!("{}/chat/{}/messages", app.address, chat_id))
        .header("Cookie", &cookie)
        .json(&json!({ "content": "Hi!" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/x-ndjson")
    );

    let body = response.text().await.expect("Failed to read stream");
    let lines: Vec<serde_json::Value> = body
        .lines()
        .map(|line| serde_json::from_str(line).expect("stream line is not json"))
        .collect();
    assert_eq!(lines[0]["fragment"], "Hello ");
    assert_eq!(lines[1]["fragment"], "there");
    assert_eq!(lines[2]["done"], true);
    assert!(lines[2]["message_id"].is_string());

    // Both turns are in the transcript now.
    let response = client
        .get(format!("{}/chat/{}", app.address, chat_id))
        .header("Cookie", &cookie)
        .send()
        .await
        .expect("Failed to execute request.");
    let body: serde_json::Value = response.json().await.expect("invalid json");
    let messages = body["item"]["messages"].as_array().expect("no messages");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "Hi!");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "Hello there");
}

#[tokio::test]
async fn missing_model_maps_to_not_found() {
    let inference = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_raw(r#"{"error":"model 'missing' not found"}"#, "application/json"),
        )
        .mount(&inference)
        .await;

    let app = common::spawn_app_with_inference(&inference.uri()).await;
    let client = reqwest::Client::new();
    let cookie = common::login(&app).await;

    let response = client
        .post(format!("{}/chat", app.address))
        .header("Cookie", &cookie)
        .json(&json!({ "title": "Doomed" }))
        .send()
        .await
        .expect("Failed to execute request.");
    let body: serde_json::Value = response.json().await.expect("invalid json");
    let chat_id = body["id"].as_str().expect("no chat id").to_string();

    let response = client
        .post(format!("{}/chat/{}/messages", app.address, chat_id))
        .header("Cookie", &cookie)
        .json(&json!({ "content": "Hi!", "model": "missing" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn unreachable_inference_server_maps_to_bad_gateway() {
    let app = common::spawn_app().await;
    let client = reqwest::Client::new();
    let cookie = common::login(&app).await;

    let response = client
        .post(format!("{}/chat", app.address))
        .header("Cookie", &cookie)
        .json(&json!({ "title": "Offline" }))
        .send()
        .await
        .expect("Failed to execute request.");
    let body: serde_json::Value = response.json().await.expect("invalid json");
    let chat_id = body["id"].as_str().expect("no chat id").to_string();

    let response = client
        .post(format!("{}/chat/{}/messages", app.address, chat_id))
        .header("Cookie", &cookie)
        .json(&json!({ "content": "Hi!" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 502);
}

#[tokio::test]
async fn model_catalog_and_preference() {
    let inference = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"models":[{"name":"llama3.1"},{"name":"mistral"}]}"#,
            "application/json",
        ))
        .mount(&inference)
        .await;

    let app = common::spawn_app_with_inference(&inference.uri()).await;
    let client = reqwest::Client::new();
    let cookie = common::login(&app).await;

    let response = client
        .get(format!("{}/models", app.address))
        .header("Cookie", &cookie)
        .send()
        .await
        .expect("Failed to execute request.");
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("invalid json");
    assert_eq!(body["item"]["models"].as_array().expect("no models").len(), 2);
    assert_eq!(body["item"]["preferred"], "llama3.1");

    let response = client
        .put(format!("{}/models/preference", app.address))
        .header("Cookie", &cookie)
        .json(&json!({ "model": "mistral" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/models", app.address))
        .header("Cookie", &cookie)
        .send()
        .await
        .expect("Failed to execute request.");
    let body: serde_json::Value = response.json().await.expect("invalid json");
    assert_eq!(body["item"]["preferred"], "mistral");

    // The account view reflects the choice too.
    let response = client
        .get(format!("{}/auth/me", app.address))
        .header("Cookie", &cookie)
        .send()
        .await
        .expect("Failed to execute request.");
    let body: serde_json::Value = response.json().await.expect("invalid json");
    assert_eq!(body["item"]["preferred_model"], "mistral");
}
