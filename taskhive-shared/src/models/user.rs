/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name TEXT NOT NULL,
///     age INT NOT NULL DEFAULT 0 CHECK (age >= 0),
///     email TEXT NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     avatar BYTEA,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The `User` struct deliberately leaves the avatar column out: profile
/// queries must not drag image bytes around, and serialized users must
/// never contain them. The avatar has its own accessors below. The
/// password hash is carried for verification but is skipped during
/// serialization, so API responses cannot leak it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// User model representing an account
///
/// Emails are stored lowercase and unique. Passwords exist only as
/// Argon2id hashes; hashing happens before any insert or update that
/// touches the password field.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name (non-empty, trimmed)
    pub name: String,

    /// Age in years, zero when not provided
    pub age: i32,

    /// Email address, stored lowercase, unique across all users
    pub email: String,

    /// Argon2id password hash, never serialized into responses
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Display name (already trimmed by the caller)
    pub name: String,

    /// Age in years
    pub age: i32,

    /// Email address (already lowercased by the caller)
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,
}

/// Input for a partial profile update
///
/// Only non-None fields are written. A changed password arrives here
/// already hashed.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    /// New display name
    pub name: Option<String>,

    /// New age
    pub age: Option<i32>,

    /// New password hash
    pub password_hash: Option<String>,
}

const USER_COLUMNS: &str = "id, name, age, email, password_hash, created_at, updated_at";

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint)
    /// or the database write fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, age, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, age, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.age)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address, case-insensitively
    ///
    /// Stored emails are lowercase, so lowering the lookup value is
    /// enough to make the match case-insensitive.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Applies a partial profile update
    ///
    /// Only the fields present in `data` are written; `updated_at` is
    /// always refreshed. Returns the updated user, or None if the user
    /// no longer exists.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build the SET clause from whichever fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.age.is_some() {
            bind_count += 1;
            query.push_str(&format!(", age = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(age) = data.age {
            q = q.bind(age);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Deletes a user and everything they own
    ///
    /// The owned tasks are deleted first, then the user row (session
    /// tokens go with it via the foreign key). The two statements are
    /// sequential, not transactional: a crash between them can leave the
    /// user without tasks but still present. That window is accepted;
    /// the reverse (tasks without their user) cannot occur.
    ///
    /// Returns true if the user existed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        crate::models::task::Task::delete_all_owned(pool, id).await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stores a user's avatar bytes
    ///
    /// The caller has already transcoded the upload to a 320x240 PNG.
    pub async fn set_avatar(pool: &PgPool, id: Uuid, png: &[u8]) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET avatar = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(png)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetches a user's avatar bytes
    ///
    /// Returns None when the user does not exist or has no avatar; the
    /// two cases are not distinguished.
    pub async fn get_avatar(pool: &PgPool, id: Uuid) -> Result<Option<Vec<u8>>, sqlx::Error> {
        let row: Option<(Option<Vec<u8>>,)> =
            sqlx::query_as("SELECT avatar FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(row.and_then(|(avatar,)| avatar))
    }

    /// Removes a user's avatar
    pub async fn clear_avatar(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET avatar = NULL, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
