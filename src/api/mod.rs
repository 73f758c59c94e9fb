//! HTTP surface of the inventory service.

mod dto;
mod errors;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query as QueryString, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::info;

use crate::inventory::{AggregateScope, DateRange, InventoryEngine, Query};

pub use errors::ApiError;

use dto::{AggregateParams, DateRangeParams, DeleteRequest, MessageResponse, UpsertRequest, UpsertResponse};

pub fn router(engine: InventoryEngine) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/inventory", post(upsert_inventory))
        .route("/inventory/delete", post(delete_inventory))
        .route("/inventories", post(query_inventories))
        .route("/inventories/filterByDateRange", get(filter_by_date_range))
        .route("/inventories/aggregate", get(aggregate_inventory))
        .with_state(engine)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn upsert_inventory(
    State(engine): State<InventoryEngine>,
    body: Result<Json<UpsertRequest>, JsonRejection>,
) -> Result<Json<UpsertResponse>, ApiError> {
    let Json(body) = body?;
    info!("Received upsert payload: {body:?}");

    let stored = engine.upsert(body.into_new_item()?).await?;
    Ok(Json(UpsertResponse { id: stored.id }))
}

async fn delete_inventory(
    State(engine): State<InventoryEngine>,
    body: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(body) = body?;
    info!("Received delete payload: {body:?}");

    let key = body.into_key()?;
    engine.delete(&key).await?;
    Ok(Json(MessageResponse {
        message: format!(
            "{} of {} category was deleted successfully",
            key.name, key.category
        ),
    }))
}

/// Paged requests get `{items, count, page, limit, total}`; requests without
/// `pagination` get the bare array of every match.
async fn query_inventories(
    State(engine): State<InventoryEngine>,
    body: Result<Json<Query>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(query) = body?;
    info!("Received query payload: {query:?}");

    let page = engine.query(&query).await?;
    if query.pagination.is_some() {
        Ok(Json(page).into_response())
    } else {
        Ok(Json(page.items).into_response())
    }
}

async fn filter_by_date_range(
    State(engine): State<InventoryEngine>,
    params: Result<QueryString<DateRangeParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let QueryString(params) = params?;
    info!("Received date range parameters: {params:?}");

    let (Some(dt_from), Some(dt_to)) = (params.dt_from, params.dt_to) else {
        return Err(ApiError::bad_request(
            "Missing required query parameters 'dt_from' or 'dt_to'",
        ));
    };
    let range = DateRange::parse(&dt_from, &dt_to)?;
    let report = engine.filter_by_date_range(&range).await?;
    Ok(Json(report).into_response())
}

async fn aggregate_inventory(
    State(engine): State<InventoryEngine>,
    params: Result<QueryString<AggregateParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let QueryString(params) = params?;
    info!("Received aggregate parameters: {params:?}");

    let category = params
        .category
        .filter(|c| AggregateScope::parse(c).is_some())
        .ok_or_else(|| ApiError::bad_request("Missing or invalid category"))?;
    let report = engine.aggregate(&category).await?;
    Ok(Json(report).into_response())
}
