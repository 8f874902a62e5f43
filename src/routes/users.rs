use std::collections::BTreeSet;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::FetchError, models::user::User, routes::with_deadline, services::users::is_valid_code,
    AppState,
};

/// Query params for GET /users.
#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    /// Comma-separated account codes, e.g. `codes=ABC123,XYZ789`.
    pub codes: Option<String>,
}

/// Split, trim and de-duplicate a `codes` parameter.
pub fn split_codes(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// GET /users?codes=c1,c2: every account that could be fetched; unknown codes are left out.
/// A malformed code rejects the whole request with 400.
pub async fn get_users(
    State(state): State<AppState>,
    Query(params): Query<UsersQuery>,
) -> Result<Json<Vec<User>>, (StatusCode, Json<Value>)> {
    let raw = params.codes.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing required query parameter: codes" })),
        )
    })?;

    let codes = split_codes(&raw);
    if let Some(bad) = codes.iter().find(|c| !is_valid_code(c)) {
        return Err(FetchError::InvalidCode(bad.clone()).into());
    }
    let users = with_deadline(state.config.request_timeout, state.comedor.fetch_users(codes)).await?;
    Ok(Json(users))
}
