/// Credential verification and the session token registry
///
/// A user's live sessions are the rows in `user_tokens`. Issuing a token
/// signs a JWT for the user and records it; revoking deletes exactly the
/// matching row, so the user's other sessions keep working. The
/// middleware treats a token with no row as revoked even when its
/// signature is still good.

use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{create_token, Claims, JwtError};
use super::password::{verify_password, PasswordError};
use crate::models::user::User;

/// Error type for credential verification
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// No user with that email
    #[error("No account for that email")]
    NotFound,

    /// Password hash comparison failed
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Underlying password machinery failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Database failure
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Error type for token issuance
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Signing failed
    #[error(transparent)]
    Jwt(#[from] JwtError),

    /// Database failure
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Looks up a user by email and checks the password
///
/// The email lookup is case-insensitive. A missing user and a wrong
/// password are distinct errors here; callers that must not leak which
/// one happened collapse them before responding.
pub async fn verify_credentials(
    pool: &PgPool,
    email: &str,
    password: &str,
) -> Result<User, CredentialError> {
    let user = User::find_by_email(pool, email)
        .await?
        .ok_or(CredentialError::NotFound)?;

    if !verify_password(password, &user.password_hash)? {
        return Err(CredentialError::InvalidCredentials);
    }

    Ok(user)
}

/// Issues a new session token for a user
///
/// Signs a two-day JWT and appends it to the user's token list. The
/// returned string is what the client presents as `Bearer <token>`.
pub async fn issue_token(pool: &PgPool, secret: &str, user_id: Uuid) -> Result<String, TokenError> {
    let token = create_token(&Claims::new(user_id), secret)?;

    sqlx::query("INSERT INTO user_tokens (user_id, token) VALUES ($1, $2)")
        .bind(user_id)
        .bind(&token)
        .execute(pool)
        .await?;

    Ok(token)
}

/// Revokes exactly one session token
///
/// Deletes the matching row; the user's other tokens remain valid.
/// Returns whether a row was actually removed.
pub async fn revoke_token(pool: &PgPool, user_id: Uuid, token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1 AND token = $2")
        .bind(user_id)
        .bind(token)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Revokes every session token a user holds
pub async fn revoke_all_tokens(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Counts a user's live session tokens
///
/// Mostly useful for tests asserting on the token lifecycle.
pub async fn count_tokens(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_tokens WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

// Database-backed behavior is covered by the API integration tests.
