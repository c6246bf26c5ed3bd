use crate::forms;
use crate::helpers::credentials::CredentialsError;
use crate::helpers::{CredentialsStore, JsonResponse};
use crate::models;
use actix_web::{post, web, Responder, Result};
use serde_valid::Validate;

#[tracing::instrument(name = "Register user.", skip(form, credentials))]
#[post("/register")]
pub async fn register(
    web::Json(form): web::Json<forms::auth::RegisterForm>,
    credentials: web::Data<CredentialsStore>,
) -> Result<impl Responder> {
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::<models::User>::build().form_error(errors.to_string()));
    }

    credentials
        .register(&form.username, &form.name, &form.email, &form.password)
        .await
        .map(|user| JsonResponse::build().set_item(user).ok("Registered"))
        .map_err(|err| match err {
            CredentialsError::UserExists => {
                JsonResponse::<models::User>::build().conflict("user already exists")
            }
            err => {
                tracing::error!("Registration failed: {:?}", err);
                JsonResponse::<models::User>::build().internal_server_error("")
            }
        })
}
