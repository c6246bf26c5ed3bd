use crate::db::ChatStore;
use crate::forms;
use crate::helpers::JsonResponse;
use crate::models;
use actix_web::{put, web, Responder, Result};
use serde_valid::Validate;
use std::sync::Arc;
use uuid::Uuid;

#[tracing::instrument(name = "Rename chat.", skip(store))]
#[put("/{id}")]
pub async fn item(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<Uuid>,
    web::Json(form): web::Json<forms::chat::ChatForm>,
    store: web::Data<dyn ChatStore>,
) -> Result<impl Responder> {
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::<models::Chat>::build().form_error(errors.to_string()));
    }

    let chat_id = path.into_inner();

    store
        .rename_chat(chat_id, &user.username, &form.title)
        .await
        .map_err(|err| {
            tracing::error!("Failed to rename chat: {:?}", err);
            JsonResponse::<models::Chat>::build().internal_server_error("")
        })?
        .map(|chat| {
            JsonResponse::build()
                .set_id(chat.id)
                .set_item(chat)
                .ok("Renamed")
        })
        .ok_or_else(|| JsonResponse::<models::Chat>::build().not_found("chat not found"))
}
