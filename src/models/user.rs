use serde::{Deserialize, Serialize};

/// Authenticated account, loaded from the credentials file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub name: String,
    pub email: String,
}
