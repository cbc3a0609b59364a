//! Email delivery inspection and manual retry endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{error::AppError, models::delivery::EmailDelivery};

use super::AppState;

/// GET /email-deliveries
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<EmailDelivery>>, AppError> {
    let deliveries = state.email_deliveries.list().await?;

    Ok(Json(deliveries))
}

/// GET /email-deliveries/{id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<EmailDelivery>, AppError> {
    let delivery = state.email_deliveries.get(id).await?;

    Ok(Json(delivery))
}

/// POST /email-deliveries/{id}/retry — re-sends the recorded subject and
/// body as-is and returns the delivery with its new status.
pub async fn retry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<EmailDelivery>, AppError> {
    let delivery = state.pipeline.retry_send(id).await?;

    Ok(Json(delivery))
}

/// DELETE /email-deliveries/{id} — hard delete, unlike the in-app channel.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.email_deliveries.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
