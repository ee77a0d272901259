use crate::domain::audit::driving_ports::LogPort;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{CrudErrorResponse, Json};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::State;
use axum::response::ErrorResponse;
use axum::routing::get;
use log::info;
use std::sync::Arc;

/// Builds a router for the task change log routes
pub fn log_routes() -> Router<Arc<SharedData>> {
    Router::new().route(
        "/",
        get(|State(app_data): AppState| async move {
            let mut ext_cxn = app_data.ext_cxn.clone();
            let log_service = domain::audit::LogService;

            get_logs(&mut ext_cxn, log_service).await
        }),
    )
}

/// Retrieves every recorded task change, most recent first.
async fn get_logs(
    ext_cxn: &mut impl ExternalConnectivity,
    log_service: impl LogPort,
) -> Result<Json<Vec<dto::ChangeLogOutput>>, ErrorResponse> {
    info!("Requested task change logs");

    let logs = log_service
        .recorded_changes(&mut *ext_cxn, &persistence::db_audit::DbLogReader)
        .await
        .map_err(CrudErrorResponse::from)?;

    Ok(Json(
        logs.into_iter().map(dto::ChangeLogOutput::from).collect(),
    ))
}
