use crate::db::ChatStore;
use crate::forms;
use crate::helpers::JsonResponse;
use crate::models;
use actix_web::{put, web, Responder, Result};
use serde_valid::Validate;
use std::sync::Arc;

#[tracing::instrument(name = "Set preferred model.", skip(store))]
#[put("/preference")]
pub async fn preference(
    user: web::ReqData<Arc<models::User>>,
    web::Json(form): web::Json<forms::model::PreferenceForm>,
    store: web::Data<dyn ChatStore>,
) -> Result<impl Responder> {
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::<models::User>::build().form_error(errors.to_string()));
    }

    store
        .set_preferred_model(&user.username, &form.model)
        .await
        .map(|_| JsonResponse::<models::User>::build().ok("Saved"))
        .map_err(|err| {
            tracing::error!("Failed to store preference: {:?}", err);
            JsonResponse::<models::User>::build().internal_server_error("")
        })
}
