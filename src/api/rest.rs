//! HTTP-facing glue shared by every entity's routes. Each function runs one generic
//! service operation and maps its error onto the common error responses, so the
//! per-entity handlers only deal in DTO conversion.

use crate::domain::crud::driven_ports::{EntityStore, RelationDetect};
use crate::domain::crud::{CrudError, CrudService, EntityMapper};
use crate::domain::search::Page;
use crate::dto;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::CrudErrorResponse;
use axum::response::ErrorResponse;
use log::error;

pub async fn create_entity<Map: EntityMapper>(
    input: &Map::Input,
    ext_cxn: &mut impl ExternalConnectivity,
    crud: &CrudService<Map>,
    store: &impl EntityStore<Entity = Map::Entity>,
    relations: &impl RelationDetect,
) -> Result<Map::Output, ErrorResponse> {
    let create_result = crud.create(input, &mut *ext_cxn, store, relations).await;

    create_result.map_err(|create_err| {
        if let CrudError::PortError(ref port_err) = create_err {
            error!("Entity create failure: {port_err}");
        }
        CrudErrorResponse::from(create_err).into()
    })
}

/// An absent ID surfaces as a 404 here rather than leaking an Option to the handler.
pub async fn fetch_entity<Map: EntityMapper>(
    id: i64,
    ext_cxn: &mut impl ExternalConnectivity,
    crud: &CrudService<Map>,
    store: &impl EntityStore<Entity = Map::Entity>,
) -> Result<Map::Output, ErrorResponse> {
    let fetch_result = crud.get_by_id(id, &mut *ext_cxn, store).await;

    match fetch_result {
        Ok(Some(entity)) => Ok(entity),
        Ok(None) => Err(CrudErrorResponse::from(CrudError::NotFound).into()),
        Err(fetch_err) => {
            error!("Entity fetch failure: {fetch_err}");
            Err(CrudErrorResponse::from(fetch_err).into())
        }
    }
}

pub async fn fetch_all_entities<Map: EntityMapper>(
    ext_cxn: &mut impl ExternalConnectivity,
    crud: &CrudService<Map>,
    store: &impl EntityStore<Entity = Map::Entity>,
) -> Result<Vec<Map::Output>, ErrorResponse> {
    let fetch_result = crud.get_all(&mut *ext_cxn, store).await;

    fetch_result.map_err(|fetch_err| {
        error!("Entity list failure: {fetch_err}");
        CrudErrorResponse::from(fetch_err).into()
    })
}

pub async fn update_entity<Map: EntityMapper>(
    id: i64,
    input: &Map::Input,
    ext_cxn: &mut impl ExternalConnectivity,
    crud: &CrudService<Map>,
    store: &impl EntityStore<Entity = Map::Entity>,
    relations: &impl RelationDetect,
) -> Result<Map::Output, ErrorResponse> {
    let update_result = crud.update(id, input, &mut *ext_cxn, store, relations).await;

    update_result.map_err(|update_err| {
        if let CrudError::PortError(ref port_err) = update_err {
            error!("Entity update failure: {port_err}");
        }
        CrudErrorResponse::from(update_err).into()
    })
}

pub async fn delete_entity<Map: EntityMapper>(
    id: i64,
    ext_cxn: &mut impl ExternalConnectivity,
    crud: &CrudService<Map>,
    store: &impl EntityStore<Entity = Map::Entity>,
) -> Result<(), ErrorResponse> {
    let delete_result = crud.delete(id, &mut *ext_cxn, store).await;

    delete_result.map_err(|delete_err| {
        error!("Entity delete failure: {delete_err}");
        CrudErrorResponse::from(delete_err).into()
    })
}

pub async fn search_entities<Map: EntityMapper, Out: From<Map::Output>>(
    request: &dto::SearchRequest,
    ext_cxn: &mut impl ExternalConnectivity,
    crud: &CrudService<Map>,
    store: &impl EntityStore<Entity = Map::Entity>,
) -> Result<dto::PageResponse<Out>, ErrorResponse> {
    let query = request.to_query();
    let search_result: Result<Page<Map::Output>, CrudError> =
        crud.search(&query, &mut *ext_cxn, store).await;

    match search_result {
        Ok(page) => Ok(dto::PageResponse::from(page)),
        Err(search_err) => {
            error!("Entity search failure: {search_err}");
            Err(CrudErrorResponse::from(search_err).into())
        }
    }
}
