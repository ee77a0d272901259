pub mod jwt;
pub mod middleware;
pub mod password;

/// Security-related configuration shared across request handlers.
pub struct SecurityConfig {
    /// Shared secret for signing and verifying JWTs (HS256)
    pub jwt_secret: String,
}
