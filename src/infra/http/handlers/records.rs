use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use serde_json::Value;

use crate::{
    application::error::AppError,
    domain::entities::Record,
    infra::http::{
        AppState,
        envelope::{ApiError, ApiResponse},
    },
};

pub async fn list_records(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Record>>, ApiError> {
    Ok(ApiResponse::success(state.records.all_records().await?))
}

pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<Record>, ApiError> {
    match state.records.record_by_id(id).await? {
        Some(record) => Ok(ApiResponse::success(record)),
        None => Err(AppError::not_found("post").into()),
    }
}

pub async fn records_by_owner(
    State(state): State<AppState>,
    Path(owner_id): Path<i64>,
) -> Result<ApiResponse<Vec<Record>>, ApiError> {
    Ok(ApiResponse::success(
        state.records.records_by_owner(owner_id).await?,
    ))
}

pub async fn generic_resource(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<ApiResponse<Value>, ApiError> {
    Ok(ApiResponse::success(state.records.fetch_resource(&path).await?))
}

pub async fn generic_resource_by_id(
    State(state): State<AppState>,
    Path((path, id)): Path<(String, String)>,
) -> Result<ApiResponse<Value>, ApiError> {
    Ok(ApiResponse::success(
        state.records.fetch_resource_by_id(&path, &id).await?,
    ))
}

pub async fn generic_query(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<ApiResponse<Value>, ApiError> {
    Ok(ApiResponse::success(
        state.records.query_resource(&path, &params).await?,
    ))
}
