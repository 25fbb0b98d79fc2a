use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use super::{post_only, ApiJson, ApiQuery};
use crate::error::{AppError, Result};
use crate::models::{
    present, DeleteMessageRequest, EditMessageRequest, EditedMessage, RoomIdQuery,
    SendMessageRequest, SentMessage,
};
use crate::state::AppState;

/// Chat routes (polled, no push channel)
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chat/messages/", get(get_room_messages))
        .route("/chat/send/", post_only(send_chat_message))
        .route("/chat/edit/", post_only(edit_chat_message))
        .route("/chat/delete/", post_only(delete_chat_message))
}

/// GET /chat/messages/?room_id= - Full history of a room, oldest first
async fn get_room_messages(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RoomIdQuery>,
) -> Result<Json<Value>> {
    let room_id = query
        .room_id
        .ok_or_else(|| AppError::BadRequest("Room ID required".to_string()))?;

    let room = state
        .rooms
        .get_room(room_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

    let messages = state.messages.list(room.id).await?;

    Ok(Json(json!({
        "status": "success",
        "room": room.name,
        "messages": messages,
    })))
}

/// POST /chat/send/ - Append a message to a room
async fn send_chat_message(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SendMessageRequest>,
) -> Result<Json<Value>> {
    let (room_id, sender_name, sender_uid, message) = match (
        request.room_id,
        present(&request.sender_name),
        present(&request.sender_uid),
        present(&request.message),
    ) {
        (Some(room_id), Some(name), Some(uid), Some(message)) => (room_id, name, uid, message),
        _ => return Err(AppError::BadRequest("Missing required fields".to_string())),
    };

    let room = state
        .rooms
        .get_room(room_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

    let sent = state
        .messages
        .append(room.id, sender_name, sender_uid, message)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Message sent",
        "data": SentMessage::from(sent),
    })))
}

/// POST /chat/edit/ - Overwrite a message body
async fn edit_chat_message(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EditMessageRequest>,
) -> Result<Json<Value>> {
    // Whitespace-only bodies pass here; only absent or empty text is refused.
    let (message_id, text) = match (request.message_id, present(&request.message)) {
        (Some(message_id), Some(text)) => (message_id, text),
        _ => return Err(AppError::BadRequest("Missing required fields".to_string())),
    };

    let edited = state.messages.edit(message_id, text).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Message updated",
        "data": EditedMessage::from(edited),
    })))
}

/// POST /chat/delete/ - Hard-delete a message
async fn delete_chat_message(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<DeleteMessageRequest>,
) -> Result<Json<Value>> {
    let message_id = request
        .message_id
        .ok_or_else(|| AppError::BadRequest("Message ID required".to_string()))?;

    state.messages.delete(message_id).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Message deleted",
    })))
}
