//! # User Repository
//!
//! Users, their password hashes, and the spend/tier pair the loyalty
//! scheme derives from paid orders.
//!
//! `password_hash` is only readable through [`UserRepository::credentials_by_email`].

use chrono::Utc;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use stockroom_core::{User, UserRole};

/// Fields supplied when registering a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub tier_id: String,
}

/// A user plus the stored password hash, for login.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user with zero spend.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - email already registered
    pub async fn create(&self, new: &NewUser) -> DbResult<User> {
        let now = Utc::now();
        let email = new.email.trim().to_lowercase();

        debug!(email = %email, role = new.role.as_str(), "Creating user");

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, name, email, password_hash, role,
                cumulative_spend_cents, tier_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?7)
            RETURNING id, name, email, role, cumulative_spend_cents, tier_id,
                      created_at, updated_at
            "#,
        )
        .bind(new_id())
        .bind(new.name.trim())
        .bind(&email)
        .bind(&new.password_hash)
        .bind(new.role)
        .bind(&new.tier_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, email.clone()),
            other => other,
        })?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        get_user(&mut conn, id).await
    }

    /// All users, oldest first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, role, cumulative_spend_cents, tier_id,
                   created_at, updated_at
            FROM users
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Looks up a user and their password hash by email (case-insensitive).
    pub async fn credentials_by_email(&self, email: &str) -> DbResult<Option<UserCredentials>> {
        let creds = sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT id, name, email, role, cumulative_spend_cents, tier_id,
                   created_at, updated_at, password_hash
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(creds)
    }

    pub async fn count_admins(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Stores a recomputed tier id.
    pub async fn set_tier(&self, id: &str, tier_id: &str) -> DbResult<User> {
        let mut conn = self.pool.acquire().await?;
        set_tier(&mut conn, id, tier_id).await
    }
}

// =============================================================================
// Connection-scoped functions
// =============================================================================

pub async fn get_user(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, role, cumulative_spend_cents, tier_id,
               created_at, updated_at
        FROM users
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(user)
}

/// Adds `delta_cents` (negative to subtract) to a user's cumulative spend,
/// flooring at zero. Returns the new spend.
pub async fn add_spend(
    conn: &mut SqliteConnection,
    user_id: &str,
    delta_cents: i64,
) -> DbResult<i64> {
    debug!(user_id = %user_id, delta_cents, "Adjusting cumulative spend");

    let spend: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE users
        SET cumulative_spend_cents = MAX(cumulative_spend_cents + ?2, 0),
            updated_at = ?3
        WHERE id = ?1
        RETURNING cumulative_spend_cents
        "#,
    )
    .bind(user_id)
    .bind(delta_cents)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;

    spend.ok_or_else(|| DbError::not_found("User", user_id))
}

pub async fn set_tier(conn: &mut SqliteConnection, user_id: &str, tier_id: &str) -> DbResult<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET tier_id = ?2, updated_at = ?3
        WHERE id = ?1
        RETURNING id, name, email, role, cumulative_spend_cents, tier_id,
                  created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(tier_id)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;

    user.ok_or_else(|| DbError::not_found("User", user_id))
}

// =============================================================================
// Unit Tests
// =============================================================================
