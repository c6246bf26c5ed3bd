use crate::db::ChatStore;
use crate::forms;
use crate::helpers::JsonResponse;
use crate::models;
use actix_web::{post, web, Responder, Result};
use serde_valid::Validate;
use std::sync::Arc;

#[tracing::instrument(name = "Create chat.", skip(store))]
#[post("")]
pub async fn item(
    user: web::ReqData<Arc<models::User>>,
    web::Json(form): web::Json<forms::chat::ChatForm>,
    store: web::Data<dyn ChatStore>,
) -> Result<impl Responder> {
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::<models::Chat>::build().form_error(errors.to_string()));
    }

    store
        .create_chat(&user.username, &form.title)
        .await
        .map(|chat| {
            JsonResponse::build()
                .set_id(chat.id)
                .set_item(chat)
                .ok("Created")
        })
        .map_err(|err| {
            tracing::error!("Failed to create chat: {:?}", err);
            JsonResponse::<models::Chat>::build().internal_server_error("")
        })
}
