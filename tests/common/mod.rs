use laama_chat::configuration::{
    AuthSettings, DatabaseEngine, DatabaseSettings, InferenceSettings, PostgresSettings, Settings,
};
use laama_chat::db::{ChatStore, SqliteChatStore};
use laama_chat::helpers::CredentialsStore;
use std::sync::Arc;

pub const TEST_USER: &str = "tester";
pub const TEST_PASSWORD: &str = "correct horse battery";

pub struct TestApp {
    pub address: String,
    pub settings: Settings,
    pub store: Arc<SqliteChatStore>,
    // Removed with the app; holds the database and credentials files.
    _dir: tempfile::TempDir,
}

pub fn test_settings(dir: &tempfile::TempDir, inference_url: &str) -> Settings {
    Settings {
        app_host: "127.0.0.1".to_string(),
        app_port: 0,
        database: DatabaseSettings {
            engine: DatabaseEngine::Sqlite,
            sqlite_path: dir
                .path()
                .join("chats.db")
                .to_string_lossy()
                .into_owned(),
            postgres: PostgresSettings {
                username: "postgres".to_string(),
                password: "postgres".to_string(),
                host: "127.0.0.1".to_string(),
                port: 5432,
                database_name: "unused".to_string(),
                encryption_key: None,
            },
        },
        inference: InferenceSettings {
            base_url: inference_url.to_string(),
            default_model: "llama3.1".to_string(),
            request_timeout_secs: 5,
        },
        auth: AuthSettings {
            credentials_file: dir
                .path()
                .join("credentials.yaml")
                .to_string_lossy()
                .into_owned(),
            cookie_name: "laama_session".to_string(),
            cookie_key: "test-cookie-key".to_string(),
            session_ttl_days: 1,
        },
    }
}

fn seed_credentials(path: &str) {
    let hash = CredentialsStore::hash_password(TEST_PASSWORD).expect("Failed to hash password");
    let yaml = format!(
        "credentials:\n  usernames:\n    {TEST_USER}:\n      name: Test User\n      email: tester@example.com\n      password: \"{hash}\"\n"
    );
    std::fs::write(path, yaml).expect("Failed to write credentials file");
}

pub async fn spawn_app() -> TestApp {
    // No inference server behind this address; tests that need one use
    // spawn_app_with_inference and a wiremock server.
    spawn_app_with_inference("http://127.0.0.1:1").await
}

pub async fn spawn_app_with_inference(inference_url: &str) -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let settings = test_settings(&dir, inference_url);
    seed_credentials(&settings.auth.credentials_file);

    let store = Arc::new(
        SqliteChatStore::connect(&settings.database.sqlite_path)
            .await
            .expect("Failed to open database"),
    );
    store.ensure_schema().await.expect("Failed to prepare schema");

    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let server = laama_chat::startup::run(listener, store.clone(), settings.clone())
        .await
        .expect("Failed to bind address.");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        settings,
        store,
        _dir: dir,
    }
}

/// Log the seeded user in and return the session cookie pair to send back.
pub async fn login(app: &TestApp) -> String {
    login_as(app, TEST_USER, TEST_PASSWORD).await
}

pub async fn login_as(app: &TestApp, username: &str, password: &str) -> String {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/auth/login", app.address))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert!(response.status().is_success(), "login failed");

    let cookie = response
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .expect("no session cookie issued")
        .to_str()
        .expect("cookie is not valid ascii");

    cookie
        .split(';')
        .next()
        .expect("empty cookie header")
        .to_string()
}
