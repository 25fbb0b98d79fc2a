use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;

use super::ApiQuery;
use crate::call_token::{CallRole, CallToken};
use crate::error::{AppError, Result};
use crate::models::present;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct TokenQuery {
    channel: Option<String>,
    #[serde(default)]
    role: CallRole,
}

/// Call token routes
pub fn token_routes() -> Router<AppState> {
    Router::new().route("/get_token/", get(get_token))
}

/// GET /get_token/?channel= - Issue a join token under a random uid
async fn get_token(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TokenQuery>,
) -> Result<Json<CallToken>> {
    let channel = present(&query.channel)
        .ok_or_else(|| AppError::BadRequest("Channel name required".to_string()))?;

    let call = state.call_tokens.issue(channel, query.role)?;
    Ok(Json(call))
}
