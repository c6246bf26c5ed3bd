use crate::helpers::JsonResponse;
use actix_web::{get, web, HttpResponse, Responder, Result};
use tera::{Context, Tera};

/// Single page: login/register forms plus the chat view. All state is
/// re-read from the server on load; the page itself is static.
#[get("/")]
pub async fn index(tera: web::Data<Tera>) -> Result<impl Responder> {
    let mut context = Context::new();
    context.insert("app_name", "Laama Chat");
    context.insert("version", env!("CARGO_PKG_VERSION"));

    tera.render("index.html", &context)
        .map(|html| HttpResponse::Ok().content_type("text/html").body(html))
        .map_err(|err| {
            tracing::error!("Template error: {:?}", err);
            JsonResponse::<()>::build().internal_server_error("template error")
        })
}
