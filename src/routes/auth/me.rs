use crate::configuration::Settings;
use crate::db::ChatStore;
use crate::helpers::JsonResponse;
use crate::models;
use actix_web::{get, web, Responder, Result};
use serde_derive::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct Account {
    pub username: String,
    pub name: String,
    pub email: String,
    /// Falls back to the configured default when the user never picked one.
    pub preferred_model: String,
}

#[tracing::instrument(name = "Get account.", skip(store, settings))]
#[get("/me")]
pub async fn me(
    user: web::ReqData<Arc<models::User>>,
    store: web::Data<dyn ChatStore>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    let preferred_model = store
        .preferred_model(&user.username)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch preference: {:?}", err);
            JsonResponse::<Account>::build().internal_server_error("")
        })?
        .unwrap_or_else(|| settings.inference.default_model.clone());

    let account = Account {
        username: user.username.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        preferred_model,
    };

    Ok(JsonResponse::build().set_item(account).ok("OK"))
}
