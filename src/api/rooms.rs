use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use super::{post_only, ApiJson, ApiQuery};
use crate::error::{AppError, Result};
use crate::models::{
    present, CodeQuery, CreateRoomRequest, CreatedRoom, NewRoom, RoomDetails, RoomListing,
};
use crate::state::AppState;

const MAX_ROOM_NAME_LEN: usize = 200;

/// Room routes
pub fn room_routes() -> Router<AppState> {
    Router::new()
        .route("/rooms/", get(list_rooms))
        .route("/rooms/create/", post_only(create_room))
        .route("/rooms/by-code/", get(get_room_by_code))
        .route("/rooms/{share_link_id}/", get(get_room_by_share_link))
}

/// POST /rooms/create/ - Create a new room
async fn create_room(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateRoomRequest>,
) -> Result<Json<Value>> {
    let name = present(&request.name)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Room name required".to_string()))?;
    if name.chars().count() > MAX_ROOM_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Room name must be at most {} characters",
            MAX_ROOM_NAME_LEN
        )));
    }

    let max_members = request
        .max_members
        .unwrap_or(state.config.default_max_members);
    if max_members < 1 {
        return Err(AppError::BadRequest(
            "max_members must be at least 1".to_string(),
        ));
    }

    let room = state
        .rooms
        .create_room(NewRoom {
            name,
            description: request.description.as_deref().unwrap_or_default(),
            max_members,
        })
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Room created successfully",
        "room": CreatedRoom::from(&room),
    })))
}

/// GET /rooms/ - List active rooms with member counts
async fn list_rooms(State(state): State<AppState>) -> Result<Json<Value>> {
    let rooms: Vec<RoomListing> = state
        .rooms
        .list_active()
        .await?
        .into_iter()
        .map(RoomListing::from)
        .collect();

    Ok(Json(json!({
        "status": "success",
        "rooms": rooms,
    })))
}

/// GET /rooms/by-code/?code= - Get an active room by its code
async fn get_room_by_code(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CodeQuery>,
) -> Result<Json<Value>> {
    let code = present(&query.code)
        .ok_or_else(|| AppError::BadRequest("Room code required".to_string()))?;

    let room = state
        .rooms
        .get_active_by_code(code)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

    room_details(&state, room).await
}

/// GET /rooms/{share_link_id}/ - Get an active room by its share link id
async fn get_room_by_share_link(
    State(state): State<AppState>,
    Path(share_link_id): Path<String>,
) -> Result<Json<Value>> {
    let room = state
        .rooms
        .get_active_by_share_link(&share_link_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

    room_details(&state, room).await
}

async fn room_details(state: &AppState, room: crate::models::Room) -> Result<Json<Value>> {
    let members_count = state.rooms.active_member_count(room.id).await?;

    Ok(Json(json!({
        "status": "success",
        "room": RoomDetails::new(room, members_count),
    })))
}
