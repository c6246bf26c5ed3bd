use crate::configuration::Settings;
use crate::db::ChatStore;
use crate::forms;
use crate::helpers::ollama::{ChatEvent, ChatMessage, OllamaError};
use crate::helpers::{JsonResponse, OllamaClient};
use crate::models;
use crate::models::MessageRole;
use actix_web::web::Bytes;
use actix_web::{post, web, HttpResponse, Responder, Result};
use serde_json::json;
use serde_valid::Validate;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

/// Post a user message and stream the assistant's reply back as NDJSON.
/// Each line is one of `{"fragment": "..."}`, `{"done": true, "message_id":
/// "..."}` or `{"error": "..."}`. The assistant turn is persisted only once
/// the completion finishes; an interrupted stream leaves the transcript at
/// the user's message.
#[tracing::instrument(name = "Send message.", skip(form, store, ollama, settings))]
#[post("/{id}/messages")]
pub async fn item(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<Uuid>,
    web::Json(form): web::Json<forms::chat::MessageForm>,
    store: web::Data<dyn ChatStore>,
    ollama: web::Data<OllamaClient>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::<models::Message>::build().form_error(errors.to_string()));
    }

    let chat_id = path.into_inner();

    store
        .fetch_chat(chat_id, &user.username)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch chat: {:?}", err);
            JsonResponse::<models::Message>::build().internal_server_error("")
        })?
        .ok_or_else(|| JsonResponse::<models::Message>::build().not_found("chat not found"))?;

    let model = match form.model {
        Some(model) => model,
        None => store
            .preferred_model(&user.username)
            .await
            .map_err(|err| {
                tracing::error!("Failed to fetch preference: {:?}", err);
                JsonResponse::<models::Message>::build().internal_server_error("")
            })?
            .unwrap_or_else(|| settings.inference.default_model.clone()),
    };

    store
        .append_message(chat_id, MessageRole::User, &form.content)
        .await
        .map_err(|err| {
            tracing::error!("Failed to store message: {:?}", err);
            JsonResponse::<models::Message>::build().internal_server_error("")
        })?;

    let history: Vec<ChatMessage> = store
        .load_messages(chat_id, &user.username)
        .await
        .map_err(|err| {
            tracing::error!("Failed to load messages: {:?}", err);
            JsonResponse::<models::Message>::build().internal_server_error("")
        })?
        .iter()
        .map(ChatMessage::from)
        .collect();

    let mut events = ollama.chat_stream(&model, history).await.map_err(|err| {
        tracing::error!("Completion request failed: {:?}", err);
        if err.is_model_missing() {
            JsonResponse::<models::Message>::build()
                .not_found(format!("model '{model}' is not available"))
        } else {
            JsonResponse::<models::Message>::build().bad_gateway(err.to_string())
        }
    })?;

    let (tx, rx) = mpsc::unbounded_channel::<Result<Bytes, Infallible>>();
    let store = store.clone();

    tokio::spawn(async move {
        let mut reply = String::new();

        while let Some(event) = events.next().await {
            match event {
                Ok(ChatEvent::Fragment(text)) => {
                    reply.push_str(&text);
                    if !send_line(&tx, json!({ "fragment": text })) {
                        // Client went away; drop the partial reply.
                        return;
                    }
                }
                Ok(ChatEvent::Done) => {
                    match store
                        .append_message(chat_id, MessageRole::Assistant, &reply)
                        .await
                    {
                        Ok(message) => {
                            send_line(&tx, json!({ "done": true, "message_id": message.id }));
                        }
                        Err(err) => {
                            tracing::error!("Failed to store reply: {:?}", err);
                            send_line(&tx, json!({ "error": "failed to store reply" }));
                        }
                    }
                    return;
                }
                Err(err) => {
                    tracing::warn!("Completion stream failed: {:?}", err);
                    send_line(&tx, json!({ "error": stream_error_text(&err) }));
                    return;
                }
            }
        }

        // Upstream closed without a final chunk.
        tracing::warn!("Completion stream ended without a done marker");
        send_line(&tx, json!({ "error": "response stream ended unexpectedly" }));
    });

    Ok(HttpResponse::Ok()
        .content_type("application/x-ndjson")
        .streaming(UnboundedReceiverStream::new(rx)))
}

fn send_line(tx: &mpsc::UnboundedSender<Result<Bytes, Infallible>>, value: serde_json::Value) -> bool {
    let mut line = value.to_string();
    line.push('\n');
    tx.send(Ok(Bytes::from(line))).is_ok()
}

fn stream_error_text(err: &OllamaError) -> String {
    match err {
        OllamaError::Stream(text) => text.clone(),
        other => other.to_string(),
    }
}
