use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::models::ChatMessage;

/// Chat log repository for SQLite operations
#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All messages of a room in the order they were written
    pub async fn list(&self, room_id: i64) -> Result<Vec<ChatMessage>> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, room_id, sender_name, sender_uid, message, is_edited, edited_at, created_at
            FROM chat_messages
            WHERE room_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(room_id = %room_id, count = messages.len(), "Listed messages");
        Ok(messages)
    }

    /// Append a message. The sender is not checked against membership.
    pub async fn append(
        &self,
        room_id: i64,
        sender_name: &str,
        sender_uid: &str,
        message: &str,
    ) -> Result<ChatMessage> {
        if message.trim().is_empty() {
            return Err(AppError::BadRequest("Message cannot be empty".to_string()));
        }

        let msg = sqlx::query_as::<_, ChatMessage>(
            r#"
            INSERT INTO chat_messages
                (room_id, sender_name, sender_uid, message, is_edited, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            RETURNING id, room_id, sender_name, sender_uid, message, is_edited, edited_at, created_at
            "#,
        )
        .bind(room_id)
        .bind(sender_name)
        .bind(sender_uid)
        .bind(message)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(room_id = %room_id, message_id = %msg.id, "Message appended");
        Ok(msg)
    }

    /// Overwrite a message body and mark it edited
    pub async fn edit(&self, message_id: i64, text: &str) -> Result<ChatMessage> {
        let msg = sqlx::query_as::<_, ChatMessage>(
            r#"
            UPDATE chat_messages
            SET message = ?, is_edited = 1, edited_at = ?
            WHERE id = ?
            RETURNING id, room_id, sender_name, sender_uid, message, is_edited, edited_at, created_at
            "#,
        )
        .bind(text)
        .bind(Utc::now())
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Message not found".to_string()))?;

        tracing::debug!(message_id = %message_id, "Message edited");
        Ok(msg)
    }

    /// Hard-delete a message
    pub async fn delete(&self, message_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE id = ?")
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Message not found".to_string()));
        }

        tracing::info!(message_id = %message_id, "Message deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::{test_pool, RoomRepository};
    use crate::models::NewRoom;

    async fn setup() -> (MessageRepository, RoomRepository, i64) {
        let pool = test_pool().await;
        let rooms = RoomRepository::new(pool.clone(), 32);
        let room = rooms
            .create_room(NewRoom {
                name: "chat",
                description: "",
                max_members: 10,
            })
            .await
            .expect("Should create room");
        (MessageRepository::new(pool), rooms, room.id)
    }

    #[tokio::test]
    async fn test_messages_listed_in_append_order() {
        let (messages, _, room_id) = setup().await;

        for text in ["A", "B", "C"] {
            messages.append(room_id, "Alice", "1", text).await.unwrap();
        }

        let texts: Vec<String> = messages
            .list(room_id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.message)
            .collect();
        assert_eq!(texts, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let (messages, _, room_id) = setup().await;

        let err = messages.append(room_id, "Alice", "1", "   \n").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Message cannot be empty"));
        assert!(messages.list(room_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_marks_message() {
        let (messages, _, room_id) = setup().await;

        let original = messages.append(room_id, "Alice", "1", "old text").await.unwrap();
        assert!(!original.is_edited);
        assert!(original.edited_at.is_none());

        messages.edit(original.id, "new text").await.unwrap();

        let listed = messages.list(room_id).await.unwrap();
        let edited = &listed[0];
        assert_eq!(edited.message, "new text");
        assert!(edited.is_edited);
        let edited_at = edited.edited_at.expect("edited_at set");
        assert!(edited_at >= edited.created_at);
        assert_eq!(edited.created_at, original.created_at);
    }

    #[tokio::test]
    async fn test_edit_and_delete_unknown_message() {
        let (messages, _, _) = setup().await;

        assert!(matches!(messages.edit(404, "x").await, Err(AppError::NotFound(_))));
        assert!(matches!(messages.delete(404).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_deleted_message_absent() {
        let (messages, _, room_id) = setup().await;

        let keep = messages.append(room_id, "Alice", "1", "keep").await.unwrap();
        let gone = messages.append(room_id, "Bob", "2", "gone").await.unwrap();
        messages.delete(gone.id).await.unwrap();

        let ids: Vec<i64> = messages.list(room_id).await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![keep.id]);
    }

    #[tokio::test]
    async fn test_room_delete_cascades_to_messages() {
        let (messages, rooms, room_id) = setup().await;

        messages.append(room_id, "Alice", "1", "hello").await.unwrap();
        rooms.delete_room(room_id).await.unwrap();

        assert!(messages.list(room_id).await.unwrap().is_empty());
    }
}
