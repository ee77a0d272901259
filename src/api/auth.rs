use crate::domain::auth::{AuthService, LoginError};
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{GenericErrorResponse, Json};
use crate::{AppState, SharedData, dto, persistence};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use log::info;
use std::sync::Arc;

/// Builds a router for the login route
pub fn auth_routes() -> Router<Arc<SharedData>> {
    Router::new().route(
        "/login",
        post(
            |State(app_data): AppState, Json(login): Json<dto::LoginRequest>| async move {
                let mut ext_cxn = app_data.ext_cxn.clone();

                log_in(login, &app_data.security.jwt_secret, &mut ext_cxn).await
            },
        ),
    )
}

/// Verifies a username/password pair and issues a bearer token. Bad credentials of any
/// kind produce the same 401 so callers can't probe for which usernames exist.
async fn log_in(
    login: dto::LoginRequest,
    jwt_secret: &str,
    ext_cxn: &mut impl ExternalConnectivity,
) -> Response {
    info!("Login attempt for {}", login.username);

    let login_result = AuthService
        .login(
            &login.username,
            &login.password,
            jwt_secret,
            &mut *ext_cxn,
            &persistence::db_user_store::DbCredentialReader,
        )
        .await;

    match login_result {
        Ok(token) => Json(dto::LoginSuccess { token }).into_response(),
        Err(LoginError::BadCredentials) => (
            StatusCode::UNAUTHORIZED,
            Json(dto::LoginFailure {
                error: "Invalid credentials".to_owned(),
            }),
        )
            .into_response(),
        Err(LoginError::PortError(port_err)) => GenericErrorResponse(port_err).into_response(),
    }
}
