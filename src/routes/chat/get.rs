use crate::db::ChatStore;
use crate::helpers::JsonResponse;
use crate::models;
use actix_web::{get, web, Responder, Result};
use serde_derive::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// One chat with its full transcript, the shape the conversation pane loads.
#[derive(Debug, Serialize)]
pub struct ChatWithMessages {
    #[serde(flatten)]
    pub chat: models::Chat,
    pub messages: Vec<models::Message>,
}

#[tracing::instrument(name = "List chats.", skip(store))]
#[get("")]
pub async fn list(
    user: web::ReqData<Arc<models::User>>,
    store: web::Data<dyn ChatStore>,
) -> Result<impl Responder> {
    store
        .list_chats(&user.username)
        .await
        .map(|chats| JsonResponse::build().set_list(chats).ok("OK"))
        .map_err(|err| {
            tracing::error!("Failed to list chats: {:?}", err);
            JsonResponse::<models::Chat>::build().internal_server_error("")
        })
}

#[tracing::instrument(name = "Get chat.", skip(store))]
#[get("/{id}")]
pub async fn item(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<Uuid>,
    store: web::Data<dyn ChatStore>,
) -> Result<impl Responder> {
    let chat_id = path.into_inner();

    let chat = store
        .fetch_chat(chat_id, &user.username)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch chat: {:?}", err);
            JsonResponse::<ChatWithMessages>::build().internal_server_error("")
        })?
        .ok_or_else(|| JsonResponse::<ChatWithMessages>::build().not_found("chat not found"))?;

    let messages = store
        .load_messages(chat_id, &user.username)
        .await
        .map_err(|err| {
            tracing::error!("Failed to load messages: {:?}", err);
            JsonResponse::<ChatWithMessages>::build().internal_server_error("")
        })?;

    Ok(JsonResponse::build()
        .set_id(chat_id)
        .set_item(ChatWithMessages { chat, messages })
        .ok("OK"))
}
