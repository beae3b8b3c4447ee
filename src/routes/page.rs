//! Map page.
//!
//! GET /: the loading notice, the error message, or the populated map for
//! the current load state.

use axum::extract::State;
use axum::response::Html;

use crate::errors::AppError;
use crate::services::loader::BalloonLoader;
use crate::services::map::render_page;

#[utoipa::path(
    get,
    path = "/",
    tag = "Map",
    responses(
        (status = 200, description = "HTML page for the current load state", body = String, content_type = "text/html"),
    )
)]
pub async fn get_map_page(State(loader): State<BalloonLoader>) -> Result<Html<String>, AppError> {
    let state = loader.state();
    let page = render_page(&*state.read().await)?;
    Ok(Html(page))
}
