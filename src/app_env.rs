/// URL for accessing the PostgreSQL database (should contain a schema name in the path)
pub const DB_URL: &str = "DATABASE_URL";
/// Log level configuration for the application. For formatting info, see
/// [tracing_subscriber's EnvFilter documentation](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
pub const LOG_LEVEL: &str = "LOG_LEVEL";

/// Shared secret used to sign and verify JWTs issued by the login endpoint
pub const JWT_SECRET: &str = "JWT_SECRET";
/// Socket address the HTTP server binds to, e.g. 0.0.0.0:8080
pub const LISTEN_ADDR: &str = "LISTEN_ADDR";
