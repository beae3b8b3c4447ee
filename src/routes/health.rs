use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::loader::BalloonLoader;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status (always "ok" while the process serves requests)
    pub status: String,
    /// API version
    pub version: String,
    /// Current load cycle state: "loading", "error" or "loaded"
    pub load_state: String,
}

/// Health check endpoint.
///
/// Returns the API status, version, and the state of the balloon load
/// cycle. A load that ended in an error does not make the service
/// unhealthy; it is reported in `load_state` only.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_check(State(loader): State<BalloonLoader>) -> Json<HealthResponse> {
    let state = loader.state();
    let load_state = state.read().await.label().to_string();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        load_state,
    })
}
