use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient_id, lenient_string};

/// Chat message row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: i64,
    #[serde(skip_serializing)]
    pub room_id: i64,
    pub sender_name: String,
    pub sender_uid: String,
    pub message: String,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub room_id: Option<i64>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sender_uid: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditMessageRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub message_id: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMessageRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub message_id: Option<i64>,
}

/// Acknowledgement of an appended message
#[derive(Debug, Serialize)]
pub struct SentMessage {
    pub id: i64,
    pub sender_name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessage> for SentMessage {
    fn from(msg: ChatMessage) -> Self {
        Self {
            id: msg.id,
            sender_name: msg.sender_name,
            message: msg.message,
            created_at: msg.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EditedMessage {
    pub id: i64,
    pub message: String,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
}

impl From<ChatMessage> for EditedMessage {
    fn from(msg: ChatMessage) -> Self {
        Self {
            id: msg.id,
            message: msg.message,
            is_edited: msg.is_edited,
            edited_at: msg.edited_at,
        }
    }
}
