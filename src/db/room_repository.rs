use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::violates_unique;
use crate::error::{AppError, Result};
use crate::models::{NewRoom, Room, RoomLookup, RoomSummary};
use crate::security::{generate_room_code, generate_share_link_id};

/// Room repository for SQLite operations
#[derive(Clone)]
pub struct RoomRepository {
    pool: SqlitePool,
    max_code_attempts: u32,
    next_code: fn() -> String,
}

impl RoomRepository {
    pub fn new(pool: SqlitePool, max_code_attempts: u32) -> Self {
        Self {
            pool,
            max_code_attempts: max_code_attempts.max(1),
            next_code: generate_room_code,
        }
    }

    #[cfg(test)]
    fn with_code_source(mut self, next_code: fn() -> String) -> Self {
        self.next_code = next_code;
        self
    }

    // ==================== Room Operations ====================

    /// Create a new room with a fresh room code and share link id.
    ///
    /// Codes are drawn until one is unused, at most `max_code_attempts` times.
    pub async fn create_room(&self, new_room: NewRoom<'_>) -> Result<Room> {
        if self.name_exists(new_room.name).await? {
            return Err(AppError::BadRequest("Room name already exists".to_string()));
        }

        for attempt in 1..=self.max_code_attempts {
            let room_code = (self.next_code)();
            if self.code_exists(&room_code).await? {
                tracing::debug!(attempt, "Room code collision, drawing again");
                continue;
            }

            let now = Utc::now();
            let inserted = sqlx::query_as::<_, Room>(
                r#"
                INSERT INTO rooms
                    (name, room_code, share_link_id, description, max_members,
                     is_active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, 1, ?, ?)
                RETURNING
                    id, name, room_code, share_link_id, description, max_members,
                    is_active, created_at, updated_at
                "#,
            )
            .bind(new_room.name)
            .bind(&room_code)
            .bind(generate_share_link_id())
            .bind(new_room.description)
            .bind(new_room.max_members)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await;

            match inserted {
                Ok(room) => {
                    tracing::info!(
                        room_id = %room.id,
                        room_code = %room.room_code,
                        name = %room.name,
                        "Room created"
                    );
                    return Ok(room);
                }
                Err(e) if violates_unique(&e, "rooms.name") => {
                    return Err(AppError::BadRequest("Room name already exists".to_string()));
                }
                // Lost a race on the code (or share link id); draw again.
                Err(e) if violates_unique(&e, "rooms.") => {
                    tracing::debug!(attempt, "Room insert hit a unique key, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::InternalError(format!(
            "Could not allocate a unique room code after {} attempts",
            self.max_code_attempts
        )))
    }

    /// Active rooms with their active-member counts, newest first
    pub async fn list_active(&self) -> Result<Vec<RoomSummary>> {
        let rooms = sqlx::query_as::<_, RoomSummary>(
            r#"
            SELECT
                r.id, r.name, r.room_code, r.share_link_id, r.description,
                r.max_members, r.created_at,
                (SELECT COUNT(*) FROM room_members m
                 WHERE m.room_id = r.id AND m.is_active = 1) AS member_count
            FROM rooms r
            WHERE r.is_active = 1
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }

    /// Get room by ID, active or not
    pub async fn get_room(&self, room_id: i64) -> Result<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, name, room_code, share_link_id, description, max_members,
                   is_active, created_at, updated_at
            FROM rooms
            WHERE id = ?
            "#,
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room)
    }

    /// Get an active room by its room code
    pub async fn get_active_by_code(&self, room_code: &str) -> Result<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, name, room_code, share_link_id, description, max_members,
                   is_active, created_at, updated_at
            FROM rooms
            WHERE room_code = ? AND is_active = 1
            "#,
        )
        .bind(room_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room)
    }

    /// Get an active room by its share link id
    pub async fn get_active_by_share_link(&self, share_link_id: &str) -> Result<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, name, room_code, share_link_id, description, max_members,
                   is_active, created_at, updated_at
            FROM rooms
            WHERE share_link_id = ? AND is_active = 1
            "#,
        )
        .bind(share_link_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room)
    }

    /// Resolve a room addressed by name or code, active or not.
    ///
    /// `ByName` also matches codes: call pages send the code under `room_name`.
    /// A code match always wins, so a room named after another room's code
    /// cannot capture its joiners.
    pub async fn find(&self, lookup: &RoomLookup) -> Result<Option<Room>> {
        let room = match lookup {
            RoomLookup::ByCode(code) => {
                sqlx::query_as::<_, Room>(
                    r#"
                    SELECT id, name, room_code, share_link_id, description, max_members,
                           is_active, created_at, updated_at
                    FROM rooms
                    WHERE room_code = ?
                    "#,
                )
                .bind(code)
                .fetch_optional(&self.pool)
                .await?
            }
            RoomLookup::ByName(name) => {
                sqlx::query_as::<_, Room>(
                    r#"
                    SELECT id, name, room_code, share_link_id, description, max_members,
                           is_active, created_at, updated_at
                    FROM rooms
                    WHERE room_code = ?1 OR name = ?1
                    ORDER BY (room_code = ?1) DESC
                    LIMIT 1
                    "#,
                )
                .bind(name)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(room)
    }

    /// Number of active members in a room
    pub async fn active_member_count(&self, room_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM room_members WHERE room_id = ? AND is_active = 1",
        )
        .bind(room_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Delete a room together with its members and messages.
    /// Returns false when no such room exists.
    pub async fn delete_room(&self, room_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = ?")
            .bind(room_id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(room_id = %room_id, "Room deleted");
        }
        Ok(deleted)
    }

    async fn name_exists(&self, name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM rooms WHERE name = ?)")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn code_exists(&self, room_code: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM rooms WHERE room_code = ?)")
                .bind(room_code)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::db::test_pool;

    fn new_room(name: &str) -> NewRoom<'_> {
        NewRoom {
            name,
            description: "",
            max_members: 10,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_room() {
        let repo = RoomRepository::new(test_pool().await, 32);

        let room = repo
            .create_room(NewRoom {
                name: "standup",
                description: "daily sync",
                max_members: 4,
            })
            .await
            .expect("Should create room");

        assert_eq!(room.name, "standup");
        assert_eq!(room.room_code.len(), 6);
        assert!(room.is_active);
        assert_eq!(room.max_members, 4);
        assert_eq!(room.share_link(), format!("/join/{}/", room.share_link_id));

        let by_id = repo.get_room(room.id).await.unwrap().expect("Should exist");
        assert_eq!(by_id.room_code, room.room_code);

        let by_code = repo.get_active_by_code(&room.room_code).await.unwrap();
        assert_eq!(by_code.map(|r| r.id), Some(room.id));

        let by_link = repo
            .get_active_by_share_link(&room.share_link_id)
            .await
            .unwrap();
        assert_eq!(by_link.map(|r| r.id), Some(room.id));
    }

    #[tokio::test]
    async fn test_room_codes_are_unique() {
        let repo = RoomRepository::new(test_pool().await, 32);

        let mut codes = HashSet::new();
        let mut links = HashSet::new();
        for i in 0..50 {
            let room = repo
                .create_room(new_room(&format!("room-{}", i)))
                .await
                .expect("Should create room");
            codes.insert(room.room_code);
            links.insert(room.share_link_id);
        }

        assert_eq!(codes.len(), 50);
        assert_eq!(links.len(), 50);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let repo = RoomRepository::new(test_pool().await, 32);

        repo.create_room(new_room("X")).await.expect("First create");
        let err = repo.create_room(new_room("X")).await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Room name already exists"));
    }

    #[tokio::test]
    async fn test_list_active_newest_first_with_counts() {
        let pool = test_pool().await;
        let repo = RoomRepository::new(pool.clone(), 32);

        let first = repo.create_room(new_room("first")).await.unwrap();
        let second = repo.create_room(new_room("second")).await.unwrap();
        let hidden = repo.create_room(new_room("hidden")).await.unwrap();

        sqlx::query("UPDATE rooms SET is_active = 0 WHERE id = ?")
            .bind(hidden.id)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO room_members (room_id, name, uid, is_active, joined_at) VALUES (?, 'a', '1', 1, ?), (?, 'b', '2', 0, ?)",
        )
        .bind(first.id)
        .bind(Utc::now())
        .bind(first.id)
        .bind(Utc::now())
        .execute(&pool)
        .await
        .unwrap();

        let rooms = repo.list_active().await.unwrap();
        let ids: Vec<i64> = rooms.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(rooms[1].member_count, 1);
        assert_eq!(rooms[0].member_count, 0);

        assert!(repo.get_active_by_code(&hidden.room_code).await.unwrap().is_none());
        assert!(repo.get_room(hidden.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_find_by_name_or_code() {
        let repo = RoomRepository::new(test_pool().await, 32);
        let room = repo.create_room(new_room("design-review")).await.unwrap();

        let by_code = repo
            .find(&RoomLookup::ByCode(room.room_code.clone()))
            .await
            .unwrap();
        assert_eq!(by_code.map(|r| r.id), Some(room.id));

        let by_name = repo
            .find(&RoomLookup::ByName("design-review".into()))
            .await
            .unwrap();
        assert_eq!(by_name.map(|r| r.id), Some(room.id));

        let code_under_name = repo
            .find(&RoomLookup::ByName(room.room_code.clone()))
            .await
            .unwrap();
        assert_eq!(code_under_name.map(|r| r.id), Some(room.id));

        let by_wrong_key = repo
            .find(&RoomLookup::ByCode("design-review".into()))
            .await
            .unwrap();
        assert!(by_wrong_key.is_none());
    }

    #[tokio::test]
    async fn test_code_match_beats_name_match() {
        let repo = RoomRepository::new(test_pool().await, 32);
        let real = repo.create_room(new_room("real")).await.unwrap();
        let squatter = repo
            .create_room(new_room(&real.room_code))
            .await
            .expect("Names are only unique among names");

        let found = repo
            .find(&RoomLookup::ByName(real.room_code.clone()))
            .await
            .unwrap();
        assert_eq!(found.map(|r| r.id), Some(real.id));
        assert_ne!(squatter.id, real.id);
    }

    #[tokio::test]
    async fn test_code_allocation_is_bounded() {
        let pool = test_pool().await;
        let fixed = RoomRepository::new(pool.clone(), 3).with_code_source(|| "AAAAAA".to_string());

        let room = fixed.create_room(new_room("taken")).await.unwrap();
        assert_eq!(room.room_code, "AAAAAA");

        let err = fixed.create_room(new_room("never")).await.unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
        assert!(fixed
            .find(&RoomLookup::ByName("never".into()))
            .await
            .unwrap()
            .is_none());
    }
}
