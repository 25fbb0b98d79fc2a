use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use super::{post_only, ApiJson, ApiQuery};
use crate::error::{AppError, Result};
use crate::models::{
    present, AddMemberRequest, LegacyMemberQuery, LegacyMemberRequest, MemberView,
    RemoveMemberRequest, Room, RoomIdQuery, RoomLookup,
};
use crate::state::AppState;

/// Membership routes addressed by numeric room id
pub fn room_member_routes() -> Router<AppState> {
    Router::new()
        .route("/rooms/members/", get(get_room_members))
        .route("/rooms/members/add/", post_only(add_room_member))
        .route("/rooms/members/remove/", post_only(remove_room_member))
}

/// Membership routes used by the call page, addressed by room code
pub fn call_member_routes() -> Router<AppState> {
    Router::new()
        .route("/create_member/", post_only(create_member))
        .route("/get_member/", get(get_member))
        .route("/delete_member/", post_only(delete_member))
}

/// POST /rooms/members/add/ - Admit a member, respecting room capacity
async fn add_room_member(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AddMemberRequest>,
) -> Result<Json<Value>> {
    let (room_id, name, uid) = match (
        request.room_id,
        present(&request.name),
        present(&request.uid),
    ) {
        (Some(room_id), Some(name), Some(uid)) => (room_id, name, uid),
        _ => return Err(AppError::BadRequest("Missing required fields".to_string())),
    };

    let room = state
        .rooms
        .get_room(room_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

    let member = state.members.admit(room.id, uid, name).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Member added to room",
        "member": {
            "id": member.id,
            "name": member.name,
            "uid": member.uid,
        },
    })))
}

/// GET /rooms/members/?room_id= - List active members of a room
async fn get_room_members(
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

    let members: Vec<MemberView> = state
        .members
        .list_active(room.id)
        .await?
        .into_iter()
        .map(MemberView::from)
        .collect();

    Ok(Json(json!({
        "status": "success",
        "room": room.name,
        "members": members,
    })))
}

/// POST /rooms/members/remove/ - Soft-remove a member
async fn remove_room_member(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RemoveMemberRequest>,
) -> Result<Json<Value>> {
    let member_id = request
        .member_id
        .ok_or_else(|| AppError::BadRequest("Member ID required".to_string()))?;

    state.members.remove(member_id).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Member removed from room",
    })))
}

/// POST /create_member/ - Register the caller in a room, keeping any existing row
async fn create_member(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LegacyMemberRequest>,
) -> Result<Json<Value>> {
    let lookup = room_lookup(&request.room_name, &request.room_code)?;
    let uid = present(&request.uid)
        .ok_or_else(|| AppError::BadRequest("UID required".to_string()))?;
    let name = present(&request.name)
        .ok_or_else(|| AppError::BadRequest("Name required".to_string()))?;

    let room = find_room(&state, &lookup).await?;
    state.members.join_or_get(room.id, uid, name).await?;

    Ok(Json(json!({
        "name": name,
        "status": "success",
    })))
}

/// GET /get_member/ - Look up a participant's display name in a room
async fn get_member(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LegacyMemberQuery>,
) -> Result<Json<Value>> {
    let lookup = room_lookup(&query.room_name, &query.room_code)?;
    let uid =
        present(&query.uid).ok_or_else(|| AppError::BadRequest("UID required".to_string()))?;

    let room = find_room(&state, &lookup).await?;
    let member = state
        .members
        .lookup(room.id, uid)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

    Ok(Json(json!({
        "name": member.name,
        "status": "success",
    })))
}

/// POST /delete_member/ - Drop a participant's membership in a room
async fn delete_member(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LegacyMemberRequest>,
) -> Result<Json<Value>> {
    let lookup = room_lookup(&request.room_name, &request.room_code)?;
    let uid = present(&request.uid)
        .ok_or_else(|| AppError::BadRequest("UID required".to_string()))?;

    let room = find_room(&state, &lookup).await?;
    state.members.leave(room.id, uid).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Member deleted",
    })))
}

fn room_lookup(room_name: &Option<String>, room_code: &Option<String>) -> Result<RoomLookup> {
    RoomLookup::from_keys(room_name, room_code)
        .ok_or_else(|| AppError::BadRequest("Room code required".to_string()))
}

async fn find_room(state: &AppState, lookup: &RoomLookup) -> Result<Room> {
    state
        .rooms
        .find(lookup)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))
}
