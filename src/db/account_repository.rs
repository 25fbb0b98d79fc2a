use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::violates_unique;
use crate::error::{AppError, Result};
use crate::models::{Account, AccountChanges, NewAccount};
use crate::security::{hash_password, verify_password};

/// Administrative account repository for SQLite operations
#[derive(Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Account>> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, password_hash, email, first_name, last_name,
                   is_active, is_staff, is_superuser, date_joined
            FROM accounts
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    pub async fn get(&self, account_id: i64) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, password_hash, email, first_name, last_name,
                   is_active, is_staff, is_superuser, date_joined
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Create an account; the password is stored as an argon2 hash only.
    pub async fn create(&self, new_account: NewAccount<'_>) -> Result<Account> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE username = ?)")
                .bind(new_account.username)
                .fetch_one(&self.pool)
                .await?;
        if exists {
            return Err(AppError::BadRequest("Username already exists".to_string()));
        }

        let password_hash = hash_off_runtime(new_account.password).await?;

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts
                (username, password_hash, email, first_name, last_name,
                 is_active, is_staff, is_superuser, date_joined)
            VALUES (?, ?, ?, ?, ?, 1, 0, 0, ?)
            RETURNING id, username, password_hash, email, first_name, last_name,
                      is_active, is_staff, is_superuser, date_joined
            "#,
        )
        .bind(new_account.username)
        .bind(&password_hash)
        .bind(new_account.email)
        .bind(new_account.first_name)
        .bind(new_account.last_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violates_unique(&e, "accounts.username") {
                AppError::BadRequest("Username already exists".to_string())
            } else {
                e.into()
            }
        })?;

        tracing::info!(account_id = %account.id, username = %account.username, "Account created");
        Ok(account)
    }

    /// Apply the fields present in `changes`
    pub async fn update(&self, account_id: i64, changes: &AccountChanges) -> Result<Account> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts SET
                email = COALESCE(?, email),
                first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                is_active = COALESCE(?, is_active),
                is_staff = COALESCE(?, is_staff),
                is_superuser = COALESCE(?, is_superuser)
            WHERE id = ?
            RETURNING id, username, password_hash, email, first_name, last_name,
                      is_active, is_staff, is_superuser, date_joined
            "#,
        )
        .bind(changes.email.as_deref())
        .bind(changes.first_name.as_deref())
        .bind(changes.last_name.as_deref())
        .bind(changes.is_active)
        .bind(changes.is_staff)
        .bind(changes.is_superuser)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!(account_id = %account_id, "Account updated");
        Ok(account)
    }

    /// Delete an account outright, returning the removed row
    pub async fn delete(&self, account_id: i64) -> Result<Account> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            DELETE FROM accounts
            WHERE id = ?
            RETURNING id, username, password_hash, email, first_name, last_name,
                      is_active, is_staff, is_superuser, date_joined
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!(account_id = %account_id, username = %account.username, "Account deleted");
        Ok(account)
    }

    /// Replace the password after verifying the current one
    pub async fn change_password(
        &self,
        account_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let account = self
            .get(account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !verify_off_runtime(old_password, account.password_hash).await? {
            return Err(AppError::BadRequest("Old password is incorrect".to_string()));
        }

        let password_hash = hash_off_runtime(new_password).await?;
        sqlx::query("UPDATE accounts SET password_hash = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        tracing::info!(account_id = %account_id, "Password changed");
        Ok(())
    }
}

/// Argon2 is CPU-bound; keep it off the async worker threads.
async fn hash_off_runtime(password: &str) -> Result<String> {
    let password = password.to_owned();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::InternalError(format!("Password hashing task failed: {}", e)))??;
    Ok(hash)
}

async fn verify_off_runtime(password: &str, hash: String) -> Result<bool> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::InternalError(format!("Password check task failed: {}", e)))
}
