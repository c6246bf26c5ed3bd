use crate::configuration::Settings;
use crate::db::ChatStore;
use crate::helpers::{CredentialsStore, OllamaClient};
use crate::middleware;
use crate::routes;
use actix_cors::Cors;
use actix_files::Files;
use actix_web::{dev::Server, error, http, middleware::Compress, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use tera::Tera;
use tracing_actix_web::TracingLogger;

pub async fn run(
    listener: TcpListener,
    store: Arc<dyn ChatStore>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let credentials = CredentialsStore::load(&settings.auth.credentials_file)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
    let credentials = web::Data::new(credentials);

    let ollama = OllamaClient::new(&settings.inference)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
    let ollama = web::Data::new(ollama);

    let tera = Tera::new("templates/**/*.html")
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
    let tera = web::Data::new(tera);

    let store = web::Data::from(store);
    let settings = web::Data::new(settings);

    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let msg: String = match err {
            error::JsonPayloadError::Deserialize(err) => format!(
                "{{\"kind\":\"deserialize\",\"line\":{}, \"column\":{}, \"msg\":\"{}\"}}",
                err.line(),
                err.column(),
                err
            ),
            _ => format!("{{\"kind\":\"other\",\"msg\":\"{}\"}}", err),
        };
        error::InternalError::new(msg, http::StatusCode::BAD_REQUEST).into()
    });

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(Cors::permissive())
            .service(web::scope("/health_check").service(routes::health_check))
            .service(routes::index::index)
            .service(
                web::scope("/auth")
                    .service(routes::auth::login)
                    .service(routes::auth::register)
                    .service(
                        web::scope("")
                            .wrap(middleware::authentication::Manager::new())
                            .service(routes::auth::me)
                            .service(routes::auth::logout)
                            .service(routes::auth::change_password),
                    ),
            )
            .service(
                web::scope("/chat")
                    .wrap(middleware::authentication::Manager::new())
                    .service(routes::chat::get::list)
                    .service(routes::chat::get::item)
                    .service(routes::chat::add::item)
                    .service(routes::chat::update::item)
                    .service(routes::chat::delete::item)
                    .service(routes::chat::message::item),
            )
            .service(
                web::scope("/models")
                    .wrap(middleware::authentication::Manager::new())
                    .service(routes::model::get::list)
                    .service(routes::model::update::preference),
            )
            .service(Files::new("/static", "./static"))
            .app_data(json_config.clone())
            .app_data(store.clone())
            .app_data(credentials.clone())
            .app_data(ollama.clone())
            .app_data(tera.clone())
            .app_data(settings.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
