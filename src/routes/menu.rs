use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;

use crate::{models::menu::Menu, routes::with_deadline, AppState};

/// GET /menu: this week's menu keyed by day
pub async fn get_menu(
    State(state): State<AppState>,
) -> Result<Json<Menu>, (StatusCode, Json<Value>)> {
    with_deadline(state.config.request_timeout, state.comedor.fetch_menu())
        .await?
        .map(Json)
        .map_err(Into::into)
}
