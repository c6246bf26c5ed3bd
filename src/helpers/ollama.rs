use crate::configuration::InferenceSettings;
use crate::models::Message;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

#[derive(Debug, thiserror::Error)]
pub enum OllamaError {
    #[error("inference server unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        source: reqwest::Error,
    },
    #[error("inference server returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid response from inference server: {0}")]
    Parse(String),
    #[error("response stream interrupted: {0}")]
    Stream(String),
}

impl OllamaError {
    pub fn is_model_missing(&self) -> bool {
        matches!(self, OllamaError::Api { status: 404, .. })
    }
}

/// One turn in the wire format the inference server expects.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.clone(),
            content: message.content.clone(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    content: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Debug)]
pub enum ChatEvent {
    Fragment(String),
    Done,
}

/// Thin client for a local Ollama-compatible inference server. Completions
/// stream back as newline-delimited JSON; we surface them fragment by
/// fragment and let the caller concatenate.
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    http: reqwest::Client,
}

impl OllamaClient {
    pub fn new(settings: &InferenceSettings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Models the inference server has pulled, for the account page picker.
    pub async fn list_models(&self) -> Result<Vec<String>, OllamaError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| OllamaError::Unreachable {
                url: self.base_url.clone(),
                source: err,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OllamaError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TagsResponse = response
            .json()
            .await
            .map_err(|err| OllamaError::Parse(err.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }

    /// Open a chat completion and return a finite, non-restartable stream of
    /// events. Errors before the first byte are returned directly; a failure
    /// mid-stream arrives as one `Err` item and ends the stream.
    pub async fn chat_stream(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<UnboundedReceiverStream<Result<ChatEvent, OllamaError>>, OllamaError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model,
            messages: &messages,
            stream: true,
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|err| OllamaError::Unreachable {
                url: self.base_url.clone(),
                source: err,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OllamaError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buf: Vec<u8> = Vec::new();

            while let Some(item) = stream.next().await {
                let chunk = match item {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        let _ = tx.send(Err(OllamaError::Stream(err.to_string())));
                        return;
                    }
                };

                buf.extend_from_slice(&chunk);
                while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buf.drain(..=pos).collect();
                    if !forward_line(&tx, &line[..line.len() - 1]) {
                        return;
                    }
                }
            }

            // A final object without a trailing newline still counts.
            if !buf.is_empty() {
                forward_line(&tx, &buf);
            }
        });

        Ok(UnboundedReceiverStream::new(rx))
    }
}

/// Parse one NDJSON line and push the resulting events. Returns `false`
/// when the stream is finished or the receiver went away.
fn forward_line(
    tx: &mpsc::UnboundedSender<Result<ChatEvent, OllamaError>>,
    line: &[u8],
) -> bool {
    if line.is_empty() {
        return true;
    }

    let chunk: ChatStreamChunk = match serde_json::from_slice(line) {
        Ok(chunk) => chunk,
        Err(err) => {
            let _ = tx.send(Err(OllamaError::Parse(err.to_string())));
            return false;
        }
    };

    if let Some(error) = chunk.error {
        let _ = tx.send(Err(OllamaError::Stream(error)));
        return false;
    }

    if let Some(message) = chunk.message {
        if !message.content.is_empty()
            && tx.send(Ok(ChatEvent::Fragment(message.content))).is_err()
        {
            return false;
        }
    }

    if chunk.done {
        let _ = tx.send(Ok(ChatEvent::Done));
        return false;
    }

    true
}
