use crate::configuration::Settings;
use crate::helpers::CredentialsStore;
use crate::middleware::authentication::{get_header, session};
use actix_web::{dev::ServiceRequest, web, HttpMessage};
use std::sync::Arc;

#[tracing::instrument(name = "Authenticate with session cookie", skip_all)]
pub async fn try_cookie(req: &mut ServiceRequest) -> Result<bool, String> {
    let cookie_header = get_header::<String>(req, "cookie")?;
    if cookie_header.is_none() {
        return Ok(false);
    }

    let settings = req
        .app_data::<web::Data<Settings>>()
        .ok_or_else(|| "app settings are not configured".to_string())?
        .clone();

    let cookies = cookie_header.unwrap();
    let token = cookies.split(';').find_map(|cookie| {
        let parts: Vec<&str> = cookie.trim().splitn(2, '=').collect();
        if parts.len() == 2 && parts[0] == settings.auth.cookie_name {
            Some(parts[1].to_string())
        } else {
            None
        }
    });

    if token.is_none() {
        return Ok(false);
    }

    let username = session::verify(&token.unwrap(), &settings.auth.cookie_key)
        .map_err(|err| err.to_string())?;

    let credentials = req
        .app_data::<web::Data<CredentialsStore>>()
        .ok_or_else(|| "credentials store is not configured".to_string())?;
    let user = credentials
        .lookup(&username)
        .await
        .ok_or_else(|| "unknown user".to_string())?;

    tracing::debug!(username = %user.username, "session cookie accepted");
    if req.extensions_mut().insert(Arc::new(user)).is_some() {
        return Err("user already logged".to_string());
    }

    Ok(true)
}
