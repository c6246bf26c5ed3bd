use crate::configuration::Settings;
use crate::helpers::JsonResponse;
use crate::models;
use actix_web::cookie::Cookie;
use actix_web::{post, web, Responder, Result};
use std::sync::Arc;

#[tracing::instrument(name = "Logout.", skip(settings))]
#[post("/logout")]
pub async fn logout(
    user: web::ReqData<Arc<models::User>>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    let mut cookie = Cookie::build(settings.auth.cookie_name.clone(), "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();

    let mut response = JsonResponse::<models::User>::build().ok("OK");
    response
        .add_cookie(&cookie)
        .map_err(|err| JsonResponse::<models::User>::build().internal_server_error(err.to_string()))?;

    tracing::info!(username = %user.username, "User logged out");
    Ok(response)
}
