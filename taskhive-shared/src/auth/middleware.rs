/// Request authentication middleware for Axum
///
/// Every protected route sits behind this middleware. A request is
/// authenticated only when all of the following hold, checked in order:
///
/// 1. An `Authorization: Bearer <token>` header is present
/// 2. The token's signature and expiration check out
/// 3. A user exists whose id matches the token's subject AND whose
///    persisted token list still contains this exact token string
///
/// Step 3 is what makes logout effective: a token that was signed
/// correctly but has since been revoked is rejected just like a forged
/// one. Any failure short-circuits with 401 and the handler never runs.
///
/// On success an [`AuthSession`] is added to the request extensions. It
/// carries the raw token string alongside the user, because logout needs
/// to revoke exactly the session that made the call.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;

use super::jwt::{validate_token, JwtError};
use crate::models::user::User;

/// Authenticated identity attached to request extensions
///
/// Handlers extract it with Axum's `Extension` extractor:
///
/// ```no_run
/// use axum::Extension;
/// use taskhive_shared::auth::middleware::AuthSession;
///
/// async fn handler(Extension(session): Extension<AuthSession>) -> String {
///     format!("Hello, {}!", session.user.name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// The authenticated user record
    pub user: User,

    /// The exact token the request presented
    pub token: String,
}

/// Error type for the authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header or Bearer prefix
    MissingCredentials,

    /// Token validation failed (signature, expiry, format)
    InvalidToken(String),

    /// Token is structurally valid but not tied to a live session
    Revoked,

    /// Database error while resolving the session
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            AuthError::Revoked => {
                (StatusCode::UNAUTHORIZED, "Token is not correct").into_response()
            }
            AuthError::DatabaseError(msg) => {
                tracing::error!("Auth middleware database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Bearer token authentication middleware
///
/// # Errors
///
/// Responds 401 Unauthorized when the header is missing, the token is
/// malformed/expired, or the session has been revoked; 500 only when the
/// session lookup itself fails.
pub async fn bearer_auth_middleware(
    pool: PgPool,
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredentials)?;

    let claims = validate_token(token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    // The subject must resolve to a user that still lists this exact
    // token. One query answers both questions at once.
    let user = find_user_for_token(&pool, claims.sub, token)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::Revoked)?;

    let session = AuthSession {
        user,
        token: token.to_string(),
    };
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

async fn find_user_for_token(
    pool: &PgPool,
    user_id: uuid::Uuid,
    token: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.name, u.age, u.email, u.password_hash, u.created_at, u.updated_at
        FROM users u
        INNER JOIN user_tokens t ON t.user_id = u.id
        WHERE u.id = $1 AND t.token = $2
        "#,
    )
    .bind(user_id)
    .bind(token)
    .fetch_optional(pool)
    .await
}

/// Creates a bearer authentication middleware closure
///
/// Captures the pool and secret so the result can be handed straight to
/// `axum::middleware::from_fn`.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use taskhive_shared::auth::middleware::create_auth_middleware;
/// use sqlx::PgPool;
///
/// fn protected_router(pool: PgPool) -> Router {
///     Router::new()
///         .route("/users/me", get(|| async { "OK" }))
///         .layer(middleware::from_fn(create_auth_middleware(pool, "secret")))
/// }
/// ```
pub fn create_auth_middleware(
    pool: PgPool,
    secret: impl Into<String>,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<
    Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>,
> + Clone {
    let secret = secret.into();
    move |req, next| {
        let pool = pool.clone();
        let secret = secret.clone();
        Box::pin(bearer_auth_middleware(pool, secret, req, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InvalidToken("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::Revoked.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::DatabaseError("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
