use crate::models::User;
use pbkdf2::password_hash::rand_core::OsRng;
use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

// Strong enough for a locally-hosted service while keeping login and the
// test suite responsive.
const PBKDF2_ROUNDS: u32 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("credentials file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("credentials file is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid username or password")]
    BadCredentials,
    #[error("user already exists")]
    UserExists,
    #[error("password hashing failed: {0}")]
    Hash(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub name: String,
    pub email: String,
    /// PHC-format PBKDF2-SHA256 hash.
    pub password: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialsFile {
    credentials: Credentials,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Credentials {
    usernames: BTreeMap<String, CredentialRecord>,
}

/// User registry backed by a YAML file, the same shape the original
/// deployment used. Registration and password changes rewrite the file.
pub struct CredentialsStore {
    path: PathBuf,
    inner: RwLock<CredentialsFile>,
}

impl CredentialsStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CredentialsError> {
        let path = path.as_ref().to_path_buf();
        let raw = std::fs::read_to_string(&path)?;
        let file: CredentialsFile = serde_yaml::from_str(&raw)?;
        tracing::info!(
            users = file.credentials.usernames.len(),
            "Loaded credentials file"
        );

        Ok(Self {
            path,
            inner: RwLock::new(file),
        })
    }

    pub fn hash_password(password: &str) -> Result<String, CredentialsError> {
        let salt = SaltString::generate(&mut OsRng);
        let params = Params {
            rounds: PBKDF2_ROUNDS,
            output_length: 32,
        };
        Pbkdf2
            .hash_password_customized(password.as_bytes(), None, None, params, &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| CredentialsError::Hash(err.to_string()))
    }

    fn verify_record(record: &CredentialRecord, password: &str) -> Result<(), CredentialsError> {
        let parsed = PasswordHash::new(&record.password)
            .map_err(|err| CredentialsError::Hash(err.to_string()))?;
        Pbkdf2
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| CredentialsError::BadCredentials)
    }

    fn user_from(username: &str, record: &CredentialRecord) -> User {
        User {
            username: username.to_string(),
            name: record.name.clone(),
            email: record.email.clone(),
        }
    }

    /// Check a username/password pair against the registry.
    pub async fn verify(&self, username: &str, password: &str) -> Result<User, CredentialsError> {
        let guard = self.inner.read().await;
        let record = guard
            .credentials
            .usernames
            .get(username)
            .ok_or(CredentialsError::BadCredentials)?;
        Self::verify_record(record, password)?;

        Ok(Self::user_from(username, record))
    }

    /// Resolve a username that was already authenticated (session cookie).
    pub async fn lookup(&self, username: &str) -> Option<User> {
        let guard = self.inner.read().await;
        guard
            .credentials
            .usernames
            .get(username)
            .map(|record| Self::user_from(username, record))
    }

    pub async fn register(
        &self,
        username: &str,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, CredentialsError> {
        let mut guard = self.inner.write().await;
        if guard.credentials.usernames.contains_key(username) {
            return Err(CredentialsError::UserExists);
        }

        let record = CredentialRecord {
            name: name.to_string(),
            email: email.to_string(),
            password: Self::hash_password(password)?,
        };
        guard
            .credentials
            .usernames
            .insert(username.to_string(), record.clone());
        self.persist(&guard)?;
        tracing::info!(username = %username, "Registered new user");

        Ok(Self::user_from(username, &record))
    }

    pub async fn set_password(
        &self,
        username: &str,
        current: &str,
        new: &str,
    ) -> Result<(), CredentialsError> {
        let mut guard = self.inner.write().await;
        let record = guard
            .credentials
            .usernames
            .get_mut(username)
            .ok_or(CredentialsError::BadCredentials)?;
        Self::verify_record(record, current)?;
        record.password = Self::hash_password(new)?;
        self.persist(&guard)?;
        tracing::info!(username = %username, "Password updated");

        Ok(())
    }

    fn persist(&self, file: &CredentialsFile) -> Result<(), CredentialsError> {
        let raw = serde_yaml::to_string(file)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_user(dir: &tempfile::TempDir) -> CredentialsStore {
        let path = dir.path().join("credentials.yaml");
        let hash = CredentialsStore::hash_password("open sesame").unwrap();
        let raw = format!(
            "credentials:\n  usernames:\n    xyarian:\n      name: Xyarian\n      email: xyarian@example.com\n      password: \"{hash}\"\n"
        );
        std::fs::write(&path, raw).unwrap();
        CredentialsStore::load(&path).unwrap()
    }

    #[tokio::test]
    async fn verify_accepts_correct_password() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_user(&dir);

        let user = store.verify("xyarian", "open sesame").await.unwrap();
        assert_eq!(user.username, "xyarian");
        assert_eq!(user.email, "xyarian@example.com");
    }

    #[tokio::test]
    async fn verify_rejects_wrong_password_and_unknown_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_user(&dir);

        assert!(matches!(
            store.verify("xyarian", "wrong").await,
            Err(CredentialsError::BadCredentials)
        ));
        assert!(matches!(
            store.verify("nobody", "open sesame").await,
            Err(CredentialsError::BadCredentials)
        ));
    }

    #[tokio::test]
    async fn register_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.yaml");
        std::fs::write(&path, "credentials:\n  usernames: {}\n").unwrap();

        let store = CredentialsStore::load(&path).unwrap();
        store
            .register("alice", "Alice", "alice@example.com", "hunter2hunter2")
            .await
            .unwrap();
        assert!(matches!(
            store
                .register("alice", "Alice", "alice@example.com", "hunter2hunter2")
                .await,
            Err(CredentialsError::UserExists)
        ));

        // A fresh load sees the registered user.
        let reloaded = CredentialsStore::load(&path).unwrap();
        let user = reloaded.verify("alice", "hunter2hunter2").await.unwrap();
        assert_eq!(user.name, "Alice");
    }

    #[tokio::test]
    async fn set_password_requires_current_password() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_user(&dir);

        assert!(matches!(
            store.set_password("xyarian", "wrong", "new password").await,
            Err(CredentialsError::BadCredentials)
        ));

        store
            .set_password("xyarian", "open sesame", "new password")
            .await
            .unwrap();
        assert!(store.verify("xyarian", "open sesame").await.is_err());
        assert!(store.verify("xyarian", "new password").await.is_ok());
    }
}
