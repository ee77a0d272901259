use crate::domain::crud::CrudService;
use crate::domain::user::UserMapper;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{Json, ValidationErrorResponse};
use crate::{AppState, SharedData, api, domain, dto, persistence};
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{get, post};
use log::info;
use std::sync::Arc;
use validator::Validate;

/// Builds a router for all the user routes
pub fn user_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            post(
                |State(app_data): AppState, Json(new_user): Json<dto::UserInput>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();

                    create_user(new_user, &mut ext_cxn).await
                },
            )
            .get(|State(app_data): AppState| async move {
                let mut ext_cxn = app_data.ext_cxn.clone();

                get_users(&mut ext_cxn).await
            }),
        )
        .route(
            "/search",
            post(
                |State(app_data): AppState, Json(search): Json<dto::SearchRequest>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();

                    search_users(search, &mut ext_cxn).await
                },
            ),
        )
        .route(
            "/:user_id",
            get(|State(app_data): AppState, Path(user_id): Path<i64>| async move {
                let mut ext_cxn = app_data.ext_cxn.clone();

                get_user(user_id, &mut ext_cxn).await
            })
            .put(
                |State(app_data): AppState,
                 Path(user_id): Path<i64>,
                 Json(user_update): Json<dto::UserInput>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();

                    update_user(user_id, user_update, &mut ext_cxn).await
                },
            )
            .delete(
                |State(app_data): AppState, Path(user_id): Path<i64>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();

                    delete_user(user_id, &mut ext_cxn).await
                },
            ),
        )
}

/// Creates a user.
async fn create_user(
    new_user: dto::UserInput,
    ext_cxn: &mut impl ExternalConnectivity,
) -> Result<Json<dto::UserOutput>, ErrorResponse> {
    info!("Attempt to create user: {new_user}");
    new_user.validate().map_err(ValidationErrorResponse::from)?;

    let crud = CrudService::new(UserMapper);
    let created = api::rest::create_entity(
        &domain::user::UserContent::from(&new_user),
        &mut *ext_cxn,
        &crud,
        &persistence::db_user_store::DbUserStore,
        &persistence::DbRelationDetect,
    )
    .await?;

    Ok(Json(dto::UserOutput::from(created)))
}

/// Retrieves a list of all the users in the system.
async fn get_users(
    ext_cxn: &mut impl ExternalConnectivity,
) -> Result<Json<Vec<dto::UserOutput>>, ErrorResponse> {
    info!("Requested users");

    let crud = CrudService::new(UserMapper);
    let users = api::rest::fetch_all_entities(
        &mut *ext_cxn,
        &crud,
        &persistence::db_user_store::DbUserStore,
    )
    .await?;

    Ok(Json(users.into_iter().map(dto::UserOutput::from).collect()))
}

/// Retrieves a single user by ID.
async fn get_user(
    user_id: i64,
    ext_cxn: &mut impl ExternalConnectivity,
) -> Result<Json<dto::UserOutput>, ErrorResponse> {
    info!("Requested user {user_id}");

    let crud = CrudService::new(UserMapper);
    let user = api::rest::fetch_entity(
        user_id,
        &mut *ext_cxn,
        &crud,
        &persistence::db_user_store::DbUserStore,
    )
    .await?;

    Ok(Json(dto::UserOutput::from(user)))
}

/// Overwrites a user's content.
async fn update_user(
    user_id: i64,
    user_update: dto::UserInput,
    ext_cxn: &mut impl ExternalConnectivity,
) -> Result<Json<dto::UserOutput>, ErrorResponse> {
    info!("Updating user {user_id}");
    user_update
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let crud = CrudService::new(UserMapper);
    let updated = api::rest::update_entity(
        user_id,
        &domain::user::UserContent::from(&user_update),
        &mut *ext_cxn,
        &crud,
        &persistence::db_user_store::DbUserStore,
        &persistence::DbRelationDetect,
    )
    .await?;

    Ok(Json(dto::UserOutput::from(updated)))
}

/// Deletes a user and, via the schema's cascade, their tasks.
async fn delete_user(
    user_id: i64,
    ext_cxn: &mut impl ExternalConnectivity,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting user {user_id}");

    let crud = CrudService::new(UserMapper);
    api::rest::delete_entity(
        user_id,
        &mut *ext_cxn,
        &crud,
        &persistence::db_user_store::DbUserStore,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Runs a paged search across users.
async fn search_users(
    search: dto::SearchRequest,
    ext_cxn: &mut impl ExternalConnectivity,
) -> Result<Json<dto::PageResponse<dto::UserOutput>>, ErrorResponse> {
    info!("Searching users");

    let crud = CrudService::new(UserMapper);
    let page = api::rest::search_entities(
        &search,
        &mut *ext_cxn,
        &crud,
        &persistence::db_user_store::DbUserStore,
    )
    .await?;

    Ok(Json(page))
}
