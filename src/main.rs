use laama_chat::configuration::{get_configuration, DatabaseEngine};
use laama_chat::db::{ChatStore, PostgresChatStore, SqliteChatStore};
use laama_chat::startup::run;
use laama_chat::telemetry::{get_subscriber, init_subscriber};
use std::net::TcpListener;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let subscriber = get_subscriber("laama_chat".into(), "info".into());
    init_subscriber(subscriber);

    let settings = get_configuration().expect("Failed to read configuration.");

    let store: Arc<dyn ChatStore> = match settings.database.engine {
        DatabaseEngine::Sqlite => {
            tracing::info!(path = %settings.database.sqlite_path, "Opening embedded database");
            let store = SqliteChatStore::connect(&settings.database.sqlite_path)
                .await
                .expect("Failed to open database.");
            Arc::new(store)
        }
        DatabaseEngine::Postgres => {
            tracing::info!(
                db_host = %settings.database.postgres.host,
                db_port = settings.database.postgres.port,
                db_name = %settings.database.postgres.database_name,
                "Connecting to PostgreSQL"
            );
            let store = PostgresChatStore::connect(&settings.database.postgres)
                .await
                .expect("Failed to connect to database.");
            Arc::new(store)
        }
    };

    store.ensure_schema().await.expect("Failed to prepare schema.");

    let address = format!("{}:{}", settings.app_host, settings.app_port);
    tracing::info!("Start server at {:?}", &address);
    let listener =
        TcpListener::bind(address).expect(&format!("failed to bind to {}", settings.app_port));

    run(listener, store, settings).await?.await
}
