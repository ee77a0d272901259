use dotenv::dotenv;
use log::info;
use std::env;
use std::sync::Arc;
use taskboard_rest::{SharedData, app_env, db, logging, persistence, router, security};

#[tokio::main]
async fn main() {
    dotenv().ok();
    logging::setup_logging_and_tracing(logging::init_env_filter());

    let db_url = env::var(app_env::DB_URL).expect("Could not get database URL from environment");
    let jwt_secret =
        env::var(app_env::JWT_SECRET).expect("Could not get the JWT secret from environment");
    let listen_addr =
        env::var(app_env::LISTEN_ADDR).unwrap_or_else(|_| "0.0.0.0:8080".to_owned());

    let db_pool = db::connect_sqlx(&db_url).await;
    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db_pool),
        security: security::SecurityConfig { jwt_secret },
    });

    let app = router(shared_data);

    info!("Starting server on {listen_addr}.");
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .expect("Could not bind to the configured listen address");
    axum::serve(listener, app)
        .await
        .expect("Server crashed while serving requests");
}
