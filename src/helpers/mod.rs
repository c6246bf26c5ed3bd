pub(crate) mod credentials;
pub(crate) mod json;
pub mod ollama;

pub use credentials::*;
pub use json::*;
pub use ollama::OllamaClient;
