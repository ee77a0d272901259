use axum::Router;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::IntoResponse;
use std::sync::Arc;

pub mod api;
pub mod app_env;
pub mod db;
pub mod domain;
pub mod dto;
pub mod external_connections;
pub mod logging;
pub mod persistence;
pub mod routing_utils;
pub mod security;

use crate::domain::auth::Role;
use crate::routing_utils::{BasicErrorResponse, Json};
use crate::security::middleware::{AuthenticatedUser, jwt_authentication, require_authority};

/// Application state shared across every request handler.
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
    pub security: security::SecurityConfig,
}

/// Extractor alias for pulling [SharedData] out of the request in handlers
pub type AppState = State<Arc<SharedData>>;

/// Catch-all for paths outside the routed API surface. Unauthenticated callers get a
/// 401 before learning whether the path exists.
async fn fallback_handler(request: Request) -> impl IntoResponse {
    if request.extensions().get::<AuthenticatedUser>().is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(BasicErrorResponse::new(
                "unauthenticated",
                "This route requires authentication.",
            )),
        )
            .into_response();
    }

    (
        StatusCode::NOT_FOUND,
        Json(BasicErrorResponse::new(
            "not_found",
            "The requested route does not exist.",
        )),
    )
        .into_response()
}

/// Assembles the app's full route tree and authorization policy: user administration is
/// superadmin-only, task and change log routes need the manager authority, login is
/// open, and anything else requires some authenticated principal.
pub fn router(shared_data: Arc<SharedData>) -> Router {
    let app_routes = Router::new()
        .nest(
            "/api/users",
            api::user::user_routes().route_layer(from_fn(|request: Request, next: Next| {
                require_authority(Role::Superadmin, request, next)
            })),
        )
        .nest(
            "/api/tasks",
            api::task::task_routes().route_layer(from_fn(|request: Request, next: Next| {
                require_authority(Role::Manager, request, next)
            })),
        )
        .nest(
            "/api/logs",
            api::logs::log_routes().route_layer(from_fn(|request: Request, next: Next| {
                require_authority(Role::Manager, request, next)
            })),
        )
        .nest("/auth", api::auth::auth_routes())
        .merge(api::swagger_main::build_documentation())
        .fallback(fallback_handler)
        .layer(from_fn_with_state(shared_data.clone(), jwt_authentication))
        .with_state(shared_data);

    logging::attach_tracing_http(app_routes)
}
