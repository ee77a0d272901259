use crate::domain::crud::CrudService;
use crate::domain::task::TaskMapper;
use crate::external_connections::{ExternalConnectivity, Transactable, TransactionHandle};
use crate::routing_utils::{CrudErrorResponse, Json, ValidationErrorResponse};
use crate::{AppState, SharedData, api, domain, dto, persistence};
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{get, post};
use log::{error, info};
use std::sync::Arc;
use validator::Validate;

/// Builds a router for all the task routes
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            post(
                |State(app_data): AppState, Json(new_task): Json<dto::TaskInput>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();

                    create_task(new_task, &mut ext_cxn).await
                },
            )
            .get(|State(app_data): AppState| async move {
                let mut ext_cxn = app_data.ext_cxn.clone();

                get_tasks(&mut ext_cxn).await
            }),
        )
        .route(
            "/search",
            post(
                |State(app_data): AppState, Json(search): Json<dto::SearchRequest>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();

                    search_tasks(search, &mut ext_cxn).await
                },
            ),
        )
        .route(
            "/:task_id",
            get(|State(app_data): AppState, Path(task_id): Path<i64>| async move {
                let mut ext_cxn = app_data.ext_cxn.clone();

                get_task(task_id, &mut ext_cxn).await
            })
            .put(
                |State(app_data): AppState,
                 Path(task_id): Path<i64>,
                 Json(task_update): Json<dto::TaskInput>| async move {
                    update_task(task_id, task_update, &app_data.ext_cxn).await
                },
            )
            .delete(
                |State(app_data): AppState, Path(task_id): Path<i64>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();

                    delete_task(task_id, &mut ext_cxn).await
                },
            ),
        )
}

/// Creates a task owned by an existing user.
async fn create_task(
    new_task: dto::TaskInput,
    ext_cxn: &mut impl ExternalConnectivity,
) -> Result<Json<dto::TaskOutput>, ErrorResponse> {
    info!("Attempt to create a task for user {}", new_task.user_id);
    new_task.validate().map_err(ValidationErrorResponse::from)?;

    let crud = CrudService::new(TaskMapper);
    let created = api::rest::create_entity(
        &domain::task::TaskContent::from(&new_task),
        &mut *ext_cxn,
        &crud,
        &persistence::db_task_store::DbTaskStore,
        &persistence::DbRelationDetect,
    )
    .await?;

    Ok(Json(dto::TaskOutput::from(created)))
}

/// Retrieves a list of all the tasks in the system.
async fn get_tasks(
    ext_cxn: &mut impl ExternalConnectivity,
) -> Result<Json<Vec<dto::TaskOutput>>, ErrorResponse> {
    info!("Requested tasks");

    let crud = CrudService::new(TaskMapper);
    let tasks = api::rest::fetch_all_entities(
        &mut *ext_cxn,
        &crud,
        &persistence::db_task_store::DbTaskStore,
    )
    .await?;

    Ok(Json(tasks.into_iter().map(dto::TaskOutput::from).collect()))
}

/// Retrieves a single task by ID.
async fn get_task(
    task_id: i64,
    ext_cxn: &mut impl ExternalConnectivity,
) -> Result<Json<dto::TaskOutput>, ErrorResponse> {
    info!("Requested task {task_id}");

    let crud = CrudService::new(TaskMapper);
    let task = api::rest::fetch_entity(
        task_id,
        &mut *ext_cxn,
        &crud,
        &persistence::db_task_store::DbTaskStore,
    )
    .await?;

    Ok(Json(dto::TaskOutput::from(task)))
}

/// Overwrites a task and records the change, both inside one transaction so the audit
/// trail can't drift from the task table.
async fn update_task<Tx: TransactionHandle>(
    task_id: i64,
    task_update: dto::TaskInput,
    transactable: &impl Transactable<Tx>,
) -> Result<Json<dto::TaskOutput>, ErrorResponse> {
    info!("Updating task {task_id}");
    task_update
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let mut txn = transactable.start_transaction().await.map_err(|txn_err| {
        error!("Could not open a transaction for a task update: {txn_err}");
        CrudErrorResponse::from(domain::crud::CrudError::PortError(txn_err))
    })?;

    let crud = CrudService::new(TaskMapper);
    let updated = domain::task::update_task(
        task_id,
        &domain::task::TaskContent::from(&task_update),
        &mut txn,
        &crud,
        &persistence::db_task_store::DbTaskStore,
        &persistence::DbRelationDetect,
        &persistence::db_audit::DbLogWriter,
    )
    .await
    .map_err(CrudErrorResponse::from)?;

    txn.commit().await.map_err(|commit_err| {
        error!("Could not commit a task update: {commit_err}");
        CrudErrorResponse::from(domain::crud::CrudError::PortError(commit_err))
    })?;

    Ok(Json(dto::TaskOutput::from(updated)))
}

/// Deletes a task.
async fn delete_task(
    task_id: i64,
    ext_cxn: &mut impl ExternalConnectivity,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting task {task_id}");

    let crud = CrudService::new(TaskMapper);
    api::rest::delete_entity(
        task_id,
        &mut *ext_cxn,
        &crud,
        &persistence::db_task_store::DbTaskStore,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Runs a paged search across tasks.
async fn search_tasks(
    search: dto::SearchRequest,
    ext_cxn: &mut impl ExternalConnectivity,
) -> Result<Json<dto::PageResponse<dto::TaskOutput>>, ErrorResponse> {
    info!("Searching tasks");

    let crud = CrudService::new(TaskMapper);
    let page = api::rest::search_entities(
        &search,
        &mut *ext_cxn,
        &crud,
        &persistence::db_task_store::DbTaskStore,
    )
    .await?;

    Ok(Json(page))
}
