use crate::forms;
use crate::helpers::credentials::CredentialsError;
use crate::helpers::{CredentialsStore, JsonResponse};
use crate::models;
use actix_web::{put, web, Responder, Result};
use serde_valid::Validate;
use std::sync::Arc;

#[tracing::instrument(name = "Change password.", skip(form, credentials))]
#[put("/password")]
pub async fn change_password(
    user: web::ReqData<Arc<models::User>>,
    web::Json(form): web::Json<forms::auth::ChangePasswordForm>,
    credentials: web::Data<CredentialsStore>,
) -> Result<impl Responder> {
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::<models::User>::build().form_error(errors.to_string()));
    }

    credentials
        .set_password(&user.username, &form.current_password, &form.new_password)
        .await
        .map(|_| JsonResponse::<models::User>::build().ok("Password modified"))
        .map_err(|err| match err {
            CredentialsError::BadCredentials => {
                JsonResponse::<models::User>::build().unauthorized("current password is wrong")
            }
            err => {
                tracing::error!("Password change failed: {:?}", err);
                JsonResponse::<models::User>::build().internal_server_error("")
            }
        })
}
