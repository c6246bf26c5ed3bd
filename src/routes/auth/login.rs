use crate::configuration::Settings;
use crate::forms;
use crate::helpers::{CredentialsStore, JsonResponse};
use crate::middleware::authentication::session;
use crate::models;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{post, web, Responder, Result};
use serde_valid::Validate;

#[tracing::instrument(name = "Login.", skip(form, credentials, settings))]
#[post("/login")]
pub async fn login(
    web::Json(form): web::Json<forms::auth::LoginForm>,
    credentials: web::Data<CredentialsStore>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    if let Err(errors) = form.validate() {
        return Err(JsonResponse::<models::User>::build().form_error(errors.to_string()));
    }

    let user = credentials
        .verify(&form.username, &form.password)
        .await
        .map_err(|err| {
            tracing::info!(username = %form.username, "Login rejected: {err}");
            JsonResponse::<models::User>::build().unauthorized("invalid username or password")
        })?;

    let token = session::issue(
        &user.username,
        &settings.auth.cookie_key,
        settings.auth.session_ttl_days,
    )
    .map_err(|err| JsonResponse::<models::User>::build().internal_server_error(err.to_string()))?;

    let cookie = Cookie::build(settings.auth.cookie_name.clone(), token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();

    let mut response = JsonResponse::build().set_item(user).ok("OK");
    response
        .add_cookie(&cookie)
        .map_err(|err| JsonResponse::<models::User>::build().internal_server_error(err.to_string()))?;

    Ok(response)
}
