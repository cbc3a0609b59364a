//! Per-user in-app inbox endpoints.
//!
//! The edge gateway authenticates the caller and injects their id as the
//! `x-user-id` header; these handlers trust it.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{error::AppError, models::delivery::InAppDelivery};

use super::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// GET /inapp-deliveries/all — the caller's inbox, soft-deleted rows hidden.
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<InAppDelivery>>, AppError> {
    let user_id = user_id_from_headers(&headers)?;
    let deliveries = state.in_app_deliveries.list_for_user(user_id).await?;

    Ok(Json(deliveries))
}

/// PUT /inapp-deliveries/{id}
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<InAppDelivery>, AppError> {
    let delivery = state.in_app_deliveries.mark_read(id).await?;

    Ok(Json(delivery))
}

/// PUT /inapp-deliveries/all
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let user_id = user_id_from_headers(&headers)?;
    let updated = state.in_app_deliveries.mark_all_read(user_id).await?;

    Ok(Json(MarkAllReadResponse { updated }))
}

/// DELETE /inapp-deliveries/{id} — soft delete; the row stays retrievable by
/// id but disappears from listings.
pub async fn soft_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.in_app_deliveries.soft_delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn user_id_from_headers(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Validation(format!("missing {} header", USER_ID_HEADER)))?;

    Uuid::parse_str(raw)
        .map_err(|_| AppError::Validation(format!("invalid {} header '{}'", USER_ID_HEADER, raw)))
}
