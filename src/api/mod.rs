pub mod chat;
pub mod health;
pub mod members;
pub mod rooms;
pub mod token;
pub mod users;

use axum::extract::{FromRequest, FromRequestParts};
use axum::handler::Handler;
use axum::routing::{post, MethodRouter};
use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::health_routes())
        .merge(token::token_routes())
        .merge(members::call_member_routes())
        .merge(users::user_routes())
        .merge(rooms::room_routes())
        .merge(members::room_member_routes())
        .merge(chat::chat_routes())
        .with_state(state)
}

/// JSON body whose rejections use the error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections use the error envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// POST route answering any other method with a 400 envelope
fn post_only<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    post(handler).fallback(post_required)
}

async fn post_required() -> AppError {
    AppError::BadRequest("POST method required".to_string())
}
