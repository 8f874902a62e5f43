use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;

use crate::{models::servings::Servings, routes::with_deadline, AppState};

/// GET /servings: today's serving counts keyed by time slot
pub async fn get_servings(
    State(state): State<AppState>,
) -> Result<Json<Servings>, (StatusCode, Json<Value>)> {
    with_deadline(state.config.request_timeout, state.comedor.fetch_servings())
        .await?
        .map(Json)
        .map_err(Into::into)
}
