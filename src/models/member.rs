use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient_id, lenient_string};

/// Room membership row. Removal only clears `is_active`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: i64,
    pub room_id: i64,
    pub name: String,
    pub uid: String,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

/// Member as listed to clients
#[derive(Debug, Serialize)]
pub struct MemberView {
    pub id: i64,
    pub name: String,
    pub uid: String,
    pub joined_at: DateTime<Utc>,
}

impl From<Member> for MemberView {
    fn from(member: Member) -> Self {
        Self {
            id: member.id,
            name: member.name,
            uid: member.uid,
            joined_at: member.joined_at,
        }
    }
}

/// Request to admit a member into a room by numeric id
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub room_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub uid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveMemberRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub member_id: Option<i64>,
}

/// Body of the call-page member endpoints, keyed by room code
#[derive(Debug, Deserialize)]
pub struct LegacyMemberRequest {
    #[serde(default)]
    pub room_name: Option<String>,
    #[serde(default)]
    pub room_code: Option<String>,
    #[serde(rename = "UID", default, deserialize_with = "lenient_string")]
    pub uid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LegacyMemberQuery {
    pub room_name: Option<String>,
    pub room_code: Option<String>,
    #[serde(rename = "UID")]
    pub uid: Option<String>,
}
