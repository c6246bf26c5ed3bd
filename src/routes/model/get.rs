use crate::configuration::Settings;
use crate::db::ChatStore;
use crate::helpers::{JsonResponse, OllamaClient};
use crate::models;
use actix_web::{get, web, Responder, Result};
use serde_derive::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ModelCatalog {
    pub models: Vec<String>,
    pub preferred: String,
    pub default: String,
}

/// Models the inference server can run, plus which one this user's next
/// message would use.
#[tracing::instrument(name = "List models.", skip(store, ollama, settings))]
#[get("")]
pub async fn list(
    user: web::ReqData<Arc<models::User>>,
    store: web::Data<dyn ChatStore>,
    ollama: web::Data<OllamaClient>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    let models = ollama.list_models().await.map_err(|err| {
        tracing::error!("Failed to list models: {:?}", err);
        JsonResponse::<ModelCatalog>::build().bad_gateway(err.to_string())
    })?;

    let preferred = store
        .preferred_model(&user.username)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch preference: {:?}", err);
            JsonResponse::<ModelCatalog>::build().internal_server_error("")
        })?
        .unwrap_or_else(|| settings.inference.default_model.clone());

    let catalog = ModelCatalog {
        models,
        preferred,
        default: settings.inference.default_model.clone(),
    };

    Ok(JsonResponse::build().set_item(catalog).ok("OK"))
}
