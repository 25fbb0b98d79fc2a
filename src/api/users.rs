use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use super::{post_only, ApiJson};
use crate::error::{AppError, Result};
use crate::models::{
    present, AccountListing, ChangePasswordRequest, CreateAccountRequest, CreatedAccount,
    DeleteAccountRequest, NewAccount, UpdateAccountRequest, UpdatedAccount,
};
use crate::state::AppState;

/// Administrative account routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/", get(get_users))
        .route("/users/create/", post_only(create_user))
        .route("/users/update/", post_only(update_user))
        .route("/users/delete/", post_only(delete_user))
        .route("/users/change-password/", post_only(change_password))
}

/// GET /users/
async fn get_users(State(state): State<AppState>) -> Result<Json<Value>> {
    let users: Vec<AccountListing> = state
        .accounts
        .list()
        .await?
        .into_iter()
        .map(AccountListing::from)
        .collect();

    Ok(Json(json!({
        "status": "success",
        "users": users,
    })))
}

/// POST /users/create/
async fn create_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateAccountRequest>,
) -> Result<Json<Value>> {
    let (username, password) = match (present(&request.username), present(&request.password)) {
        (Some(username), Some(password)) => (username, password),
        _ => {
            return Err(AppError::BadRequest(
                "Username and password required".to_string(),
            ))
        }
    };

    let account = state
        .accounts
        .create(NewAccount {
            username,
            password,
            email: request.email.as_deref().unwrap_or_default(),
            first_name: request.first_name.as_deref().unwrap_or_default(),
            last_name: request.last_name.as_deref().unwrap_or_default(),
        })
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "User created successfully",
        "user": CreatedAccount::from(account),
    })))
}

/// POST /users/update/ - Partial update, absent fields untouched
async fn update_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateAccountRequest>,
) -> Result<Json<Value>> {
    let user_id = request
        .user_id
        .ok_or_else(|| AppError::BadRequest("User ID required".to_string()))?;

    let account = state.accounts.update(user_id, &request.changes).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "User updated successfully",
        "user": UpdatedAccount::from(account),
    })))
}

/// POST /users/delete/
async fn delete_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<DeleteAccountRequest>,
) -> Result<Json<Value>> {
    let user_id = request
        .user_id
        .ok_or_else(|| AppError::BadRequest("User ID required".to_string()))?;

    let account = state.accounts.delete(user_id).await?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("User {} deleted successfully", account.username),
    })))
}

/// POST /users/change-password/
async fn change_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<Json<Value>> {
    let (user_id, old_password, new_password) = match (
        request.user_id,
        present(&request.old_password),
        present(&request.new_password),
    ) {
        (Some(user_id), Some(old), Some(new)) => (user_id, old, new),
        _ => return Err(AppError::BadRequest("All fields required".to_string())),
    };

    state
        .accounts
        .change_password(user_id, old_password, new_password)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Password changed successfully",
    })))
}
