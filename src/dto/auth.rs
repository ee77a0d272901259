use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// DTO for a login attempt
#[derive(Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct LoginRequest {
    #[schema(example = "jdoe")]
    pub username: String,
    pub password: String,
}

/// DTO carrying the bearer token issued for a successful login
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct LoginSuccess {
    pub token: String,
}

/// DTO for a rejected login
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct LoginFailure {
    #[schema(example = "Invalid credentials")]
    pub error: String,
}
