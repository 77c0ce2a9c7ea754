use crate::{errors::AppError, AppState};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing;

/// Handler for GET /api/memes. Takes no input; returns one meme or an error body.
pub async fn get_random_meme(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    tracing::debug!("Resolving random meme via handler");
    let meme = state.resolver.resolve().await?;
    Ok(Json(meme))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
