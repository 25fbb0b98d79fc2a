use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::models::Member;

/// Membership repository for SQLite operations
#[derive(Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the (room, uid) membership unless it already exists.
    /// An existing row is returned untouched, whatever its name or state.
    pub async fn join_or_get(&self, room_id: i64, uid: &str, name: &str) -> Result<Member> {
        let result = sqlx::query(
            r#"
            INSERT INTO room_members (room_id, name, uid, is_active, joined_at)
            VALUES (?, ?, ?, 1, ?)
            ON CONFLICT (room_id, uid) DO NOTHING
            "#,
        )
        .bind(room_id)
        .bind(name)
        .bind(uid)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            tracing::info!(room_id = %room_id, uid = %uid, "Member joined");
        }

        self.lookup(room_id, uid)
            .await?
            .ok_or_else(|| AppError::InternalError("Member vanished after join".to_string()))
    }

    /// Admit a member while the room has spare capacity.
    ///
    /// Capacity check, insert and reactivation are one statement, so
    /// concurrent admissions cannot push the active count past `max_members`.
    pub async fn admit(&self, room_id: i64, uid: &str, name: &str) -> Result<Member> {
        let result = sqlx::query(
            r#"
            INSERT INTO room_members (room_id, name, uid, is_active, joined_at)
            SELECT ?1, ?2, ?3, 1, ?4
            WHERE (SELECT COUNT(*) FROM room_members
                   WHERE room_id = ?1 AND is_active = 1)
                < (SELECT max_members FROM rooms WHERE id = ?1)
            ON CONFLICT (room_id, uid) DO UPDATE SET is_active = 1
            "#,
        )
        .bind(room_id)
        .bind(name)
        .bind(uid)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::info!(room_id = %room_id, uid = %uid, "Room is full");
            return Err(AppError::RoomFull);
        }

        let member = self
            .lookup(room_id, uid)
            .await?
            .ok_or_else(|| AppError::InternalError("Member vanished after admit".to_string()))?;

        tracing::info!(room_id = %room_id, member_id = %member.id, uid = %uid, "Member admitted");
        Ok(member)
    }

    /// Soft-remove a member by id
    pub async fn remove(&self, member_id: i64) -> Result<()> {
        let result = sqlx::query("UPDATE room_members SET is_active = 0 WHERE id = ?")
            .bind(member_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Member not found".to_string()));
        }

        tracing::info!(member_id = %member_id, "Member removed");
        Ok(())
    }

    /// Delete the membership of `uid` in a room, so a later join starts fresh
    pub async fn leave(&self, room_id: i64, uid: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM room_members WHERE room_id = ? AND uid = ?")
            .bind(room_id)
            .bind(uid)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Member not found".to_string()));
        }

        tracing::info!(room_id = %room_id, uid = %uid, "Member left");
        Ok(())
    }

    /// Get the membership of `uid` in a room, active or not
    pub async fn lookup(&self, room_id: i64, uid: &str) -> Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, room_id, name, uid, is_active, joined_at
            FROM room_members
            WHERE room_id = ? AND uid = ?
            "#,
        )
        .bind(room_id)
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Get member by ID, active or not
    pub async fn get(&self, member_id: i64) -> Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            "SELECT id, room_id, name, uid, is_active, joined_at FROM room_members WHERE id = ?",
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Active members of a room, most recent first
    pub async fn list_active(&self, room_id: i64) -> Result<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, room_id, name, uid, is_active, joined_at
            FROM room_members
            WHERE room_id = ? AND is_active = 1
            ORDER BY joined_at DESC, id DESC
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(room_id = %room_id, count = members.len(), "Listed members");
        Ok(members)
    }
}
