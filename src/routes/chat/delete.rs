use crate::db::ChatStore;
use crate::helpers::JsonResponse;
use crate::models;
use actix_web::{delete, web, Responder, Result};
use std::sync::Arc;
use uuid::Uuid;

#[tracing::instrument(name = "Delete chat.", skip(store))]
#[delete("/{id}")]
pub async fn item(
    user: web::ReqData<Arc<models::User>>,
    path: web::Path<Uuid>,
    store: web::Data<dyn ChatStore>,
) -> Result<impl Responder> {
    let chat_id = path.into_inner();

    let removed = store
        .delete_chat(chat_id, &user.username)
        .await
        .map_err(|err| {
            tracing::error!("Failed to delete chat: {:?}", err);
            JsonResponse::<models::Chat>::build().internal_server_error("")
        })?;

    if removed == 0 {
        return Err(JsonResponse::<models::Chat>::build().not_found("chat not found"));
    }

    Ok(JsonResponse::<models::Chat>::build().set_id(chat_id).ok("Deleted"))
}
