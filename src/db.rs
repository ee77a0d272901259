use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Connects to the PostgreSQL database at [db_url], panicking if the database
/// is unreachable since the app can't do anything useful without it.
pub async fn connect_sqlx(db_url: &str) -> PgPool {
    PgPoolOptions::new()
        .max_connections(16)
        .connect(db_url)
        .await
        .expect("Could not connect to the database")
}
