//! Template management endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::template::{CreateTemplate, Template, UpdateTemplate},
};

use super::AppState;

/// POST /templates
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTemplate>,
) -> Result<(StatusCode, Json<Template>), AppError> {
    let template = state.templates.create(request).await?;

    Ok((StatusCode::CREATED, Json(template)))
}

/// GET /templates
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Template>>, AppError> {
    let templates = state.templates.list().await?;

    Ok(Json(templates))
}

/// GET /templates/{event_type}
pub async fn get_by_event_type(
    State(state): State<Arc<AppState>>,
    Path(event_type): Path<String>,
) -> Result<Json<Template>, AppError> {
    let template = state.templates.resolve_by_event_type(&event_type).await?;

    Ok(Json(template))
}

/// PUT /templates/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTemplate>,
) -> Result<Json<Template>, AppError> {
    let id = parse_id(&id)?;
    let template = state.templates.update(id, request).await?;

    Ok(Json(template))
}

/// DELETE /templates/{id} — soft delete; repeating it is a 404.
pub async fn soft_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    state.templates.soft_delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("invalid template id '{}'", raw)))
}
