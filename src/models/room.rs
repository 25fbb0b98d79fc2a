use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient_id, present};

/// Room row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub room_code: String,
    pub share_link_id: String,
    pub description: Option<String>,
    pub max_members: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Public join path built from the share link id
    pub fn share_link(&self) -> String {
        share_link_path(&self.share_link_id)
    }
}

fn share_link_path(share_link_id: &str) -> String {
    format!("/join/{}/", share_link_id)
}

/// Active room annotated with its active-member count
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoomSummary {
    pub id: i64,
    pub name: String,
    pub room_code: String,
    pub share_link_id: String,
    pub description: Option<String>,
    pub max_members: i64,
    pub created_at: DateTime<Utc>,
    pub member_count: i64,
}

/// Input for inserting a room
#[derive(Debug, Clone, Copy)]
pub struct NewRoom<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub max_members: i64,
}

/// How a room is addressed by clients that do not know its numeric id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomLookup {
    ByName(String),
    ByCode(String),
}

impl RoomLookup {
    /// `room_name` wins over `room_code` when both are sent.
    pub fn from_keys(room_name: &Option<String>, room_code: &Option<String>) -> Option<Self> {
        present(room_name)
            .map(|name| RoomLookup::ByName(name.to_string()))
            .or_else(|| present(room_code).map(|code| RoomLookup::ByCode(code.to_string())))
    }
}

/// Request to create a room
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub max_members: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CodeQuery {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoomIdQuery {
    pub room_id: Option<i64>,
}

/// Room returned right after creation
#[derive(Debug, Serialize)]
pub struct CreatedRoom {
    pub id: i64,
    pub name: String,
    pub room_code: String,
    pub share_link: String,
    pub share_link_id: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Room> for CreatedRoom {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            name: room.name.clone(),
            room_code: room.room_code.clone(),
            share_link: room.share_link(),
            share_link_id: room.share_link_id.clone(),
            description: room.description.clone(),
            created_at: room.created_at,
        }
    }
}

/// Entry of the active room listing
#[derive(Debug, Serialize)]
pub struct RoomListing {
    pub id: i64,
    pub name: String,
    pub room_code: String,
    pub share_link_id: String,
    pub share_link: String,
    pub description: Option<String>,
    pub max_members: i64,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<RoomSummary> for RoomListing {
    fn from(summary: RoomSummary) -> Self {
        Self {
            share_link: share_link_path(&summary.share_link_id),
            id: summary.id,
            name: summary.name,
            room_code: summary.room_code,
            share_link_id: summary.share_link_id,
            description: summary.description,
            max_members: summary.max_members,
            member_count: summary.member_count,
            created_at: summary.created_at,
        }
    }
}

/// Room details returned by code and share-link lookups
#[derive(Debug, Serialize)]
pub struct RoomDetails {
    pub id: i64,
    pub name: String,
    pub room_code: String,
    pub description: Option<String>,
    pub max_members: i64,
    pub members_count: i64,
    pub created_at: DateTime<Utc>,
}

impl RoomDetails {
    pub fn new(room: Room, members_count: i64) -> Self {
        Self {
            id: room.id,
            name: room.name,
            room_code: room.room_code,
            description: room.description,
            max_members: room.max_members,
            members_count,
            created_at: room.created_at,
        }
    }
}
