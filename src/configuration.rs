use serde;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Settings {
    pub app_host: String,
    pub app_port: u16,
    pub database: DatabaseSettings,
    pub inference: InferenceSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct DatabaseSettings {
    pub engine: DatabaseEngine,
    pub sqlite_path: String,
    pub postgres: PostgresSettings,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PostgresSettings {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database_name: String,
    /// When set, message content is stored encrypted with pgcrypto's
    /// `pgp_sym_encrypt` under this key. Requires the pgcrypto extension.
    pub encryption_key: Option<String>,
}

impl PostgresSettings {
    // Connection string: postgresql://<username>:<password>@<host>:<port>/<database_name>
    pub fn connection_string(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name,
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port,
        )
    }

    /// Environment overrides for the client-server backend, so deployments
    /// can keep secrets out of the configuration file.
    pub fn merge_env(&mut self) {
        if let Ok(host) = std::env::var("PG_HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("PG_PORT") {
            if let Ok(port) = port.parse() {
                self.port = port;
            }
        }
        if let Ok(username) = std::env::var("PG_USERNAME") {
            self.username = username;
        }
        if let Ok(password) = std::env::var("PG_PASSWORD") {
            self.password = password;
        }
        if let Ok(database_name) = std::env::var("PG_DATABASE") {
            self.database_name = database_name;
        }
        if let Ok(key) = std::env::var("PG_ENCRYPTION_KEY") {
            self.encryption_key = Some(key);
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct InferenceSettings {
    pub base_url: String,
    pub default_model: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AuthSettings {
    pub credentials_file: String,
    pub cookie_name: String,
    pub cookie_key: String,
    pub session_ttl_days: i64,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let mut settings = config::Config::default();

    // Add configuration values from a file named `configuration`
    // with the .yaml extension
    settings.merge(config::File::with_name("configuration"))?;

    let mut config: Settings = settings.try_deserialize()?;

    config.database.postgres.merge_env();
    if let Ok(key) = std::env::var("LAAMA_COOKIE_KEY") {
        config.auth.cookie_key = key;
    }

    Ok(config)
}
