use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::{AppError, ErrorResponse};
use crate::services::loader::{BalloonLoader, LoadState};
use crate::services::map::{build_map_view, MapView};

/// Response body when a reload is accepted.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReloadResponse {
    /// Always "loading": the new cycle has started
    pub state: String,
}

/// Get the result of the current load cycle.
///
/// Returns `{"state": "loading"}`, `{"state": "error", "message": ...}`, or
/// `{"state": "loaded", "balloons": [...], "loaded_at": ...}`.
#[utoipa::path(
    get,
    path = "/api/v1/balloons",
    tag = "Balloons",
    responses(
        (status = 200, description = "Current load state", body = LoadState),
    )
)]
pub async fn get_balloons(State(loader): State<BalloonLoader>) -> Json<LoadState> {
    let state = loader.state();
    let current = state.read().await.clone();
    Json(current)
}

/// Get render-ready map data: markers with colors and popups, map defaults,
/// and the footer summary.
///
/// Only available once a cycle has loaded data.
#[utoipa::path(
    get,
    path = "/api/v1/balloons/map",
    tag = "Balloons",
    responses(
        (status = 200, description = "Map markers and summary", body = MapView),
        (status = 503, description = "Still loading, or the last cycle failed", body = ErrorResponse),
    )
)]
pub async fn get_map_view(State(loader): State<BalloonLoader>) -> Result<Json<MapView>, AppError> {
    let state = loader.state();
    let current = state.read().await;
    match &*current {
        LoadState::Loaded { balloons, .. } => Ok(Json(build_map_view(balloons))),
        LoadState::Loading => Err(AppError::Unavailable(
            "Balloon data is still loading".to_string(),
        )),
        LoadState::Error { message } => Err(AppError::Unavailable(message.clone())),
    }
}

/// Start a new load cycle.
///
/// Only one cycle runs at a time; a reload while one is in flight is
/// rejected rather than queued.
#[utoipa::path(
    post,
    path = "/api/v1/balloons/reload",
    tag = "Balloons",
    responses(
        (status = 202, description = "New load cycle started", body = ReloadResponse),
        (status = 409, description = "A load cycle is already in progress", body = ErrorResponse),
    )
)]
pub async fn reload_balloons(
    State(loader): State<BalloonLoader>,
) -> Result<(StatusCode, Json<ReloadResponse>), AppError> {
    loader.start().await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ReloadResponse {
            state: LoadState::Loading.label().to_string(),
        }),
    ))
}
