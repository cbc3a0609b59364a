pub mod email;
pub mod inbox;
pub mod templates;

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    clients::health::HealthChecker,
    config::Config,
    models::health::HealthStatus,
    pipeline::Pipeline,
    store::{EmailDeliveryStore, InAppDeliveryStore, TemplateStore},
};

pub struct AppState {
    pub templates: Arc<dyn TemplateStore>,
    pub email_deliveries: Arc<dyn EmailDeliveryStore>,
    pub in_app_deliveries: Arc<dyn InAppDeliveryStore>,
    pub pipeline: Arc<Pipeline>,
    pub health_checker: HealthChecker,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/templates", post(templates::create).get(templates::list))
        // GET resolves by event type; PUT/DELETE address a template id.
        .route(
            "/templates/{key}",
            get(templates::get_by_event_type)
                .put(templates::update)
                .delete(templates::soft_delete),
        )
        .route("/email-deliveries", get(email::list))
        .route(
            "/email-deliveries/{id}",
            get(email::get).delete(email::delete),
        )
        .route("/email-deliveries/{id}/retry", post(email::retry))
        .route(
            "/inapp-deliveries/all",
            get(inbox::list).put(inbox::mark_all_read),
        )
        .route(
            "/inapp-deliveries/{id}",
            put(inbox::mark_read).delete(inbox::soft_delete),
        )
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_api_server(config: &Config, state: Arc<AppState>) -> Result<(), anyhow::Error> {
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr).await?;

    info!(address = %addr, "Management API server started");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_checker.check_all().await;

    let status_code = match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}
