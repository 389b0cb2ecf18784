/// User endpoints
///
/// Registration, login/logout, the authenticated profile, and avatars.
///
/// # Endpoints
///
/// - `POST /users` - Register and receive a first session token
/// - `POST /users/login` - Login, receive a new session token
/// - `POST /users/logout` - Revoke the presenting session's token
/// - `POST /users/logoutAll` - Revoke every session token
/// - `GET /users/me` - Own profile
/// - `PATCH /users/me` - Partial profile update (name, age, password)
/// - `DELETE /users/me` - Delete the account and everything it owns
/// - `POST /users/me/avatar` - Upload an avatar (jpg/jpeg/png, max 1 MB)
/// - `DELETE /users/me/avatar` - Remove the avatar
/// - `GET /users/:id/avatar` - Public avatar image (always PNG)

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskhive_shared::{
    auth::{
        middleware::AuthSession,
        password::{hash_password, validate_password},
        tokens,
    },
    models::user::{CreateUser, UpdateUser, User},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};

/// Fields a profile update may touch
const USER_UPDATE_FIELDS: &[&str] = &["name", "age", "password"];

/// Avatar upload size cap (1 MB)
const MAX_AVATAR_BYTES: usize = 1_000_000;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    pub name: String,

    /// Age in years, defaults to 0 when omitted
    #[serde(default)]
    #[validate(range(min = 0, message = "Age must be a positive number"))]
    pub age: i32,

    /// Email address
    #[validate(email(message = "Email is not correct"))]
    pub email: String,

    /// Password (also checked against the account policy)
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address (case-insensitive)
    pub email: String,

    /// Password
    pub password: String,
}

/// Response for registration and login: the user plus a session token
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The user record (no password, tokens, or avatar)
    pub user: User,

    /// The freshly issued session token
    pub token: String,
}

fn field_error(field: &str, message: impl Into<String>) -> ApiError {
    ApiError::ValidationError(vec![ValidationErrorDetail {
        field: field.to_string(),
        message: message.into(),
    }])
}

/// Register a new user
///
/// Creates the account, fires the welcome mail, and issues the first
/// session token.
///
/// # Endpoint
///
/// ```text
/// POST /users
/// Content-Type: application/json
///
/// { "name": "Ada", "age": 30, "email": "ada@example.com", "password": "pass1234" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: validation failed or the email is taken
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(field_error("name", "Name is required"));
    }

    let email = req.email.trim().to_lowercase();
    let password = req.password.trim();
    validate_password(password).map_err(|msg| field_error("password", msg))?;

    let password_hash = hash_password(password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name,
            age: req.age,
            email,
            password_hash,
        },
    )
    .await?;

    // Fire-and-forget; registration never waits on mail
    state.mailer.send_welcome(&user.email, &user.name);

    let token = tokens::issue_token(&state.db, state.jwt_secret(), user.id).await?;

    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// Login with email and password
///
/// # Endpoint
///
/// ```text
/// POST /users/login
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: unknown email or wrong password, reported
///   identically
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = tokens::verify_credentials(&state.db, &req.email, &req.password).await?;
    let token = tokens::issue_token(&state.db, state.jwt_secret(), user.id).await?;

    Ok(Json(AuthResponse { user, token }))
}

/// Logout the presenting session
///
/// Removes exactly the token this request authenticated with; the user's
/// other sessions stay logged in.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<StatusCode> {
    tokens::revoke_token(&state.db, session.user.id, &session.token).await?;
    Ok(StatusCode::OK)
}

/// Logout every session
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<StatusCode> {
    tokens::revoke_all_tokens(&state.db, session.user.id).await?;
    Ok(StatusCode::OK)
}

/// Get the authenticated user's profile
pub async fn me(Extension(session): Extension<AuthSession>) -> Json<User> {
    Json(session.user)
}

/// Partial profile update
///
/// Accepts only `name`, `age`, and `password`; a body with any other key
/// is rejected wholesale before anything is written. A changed password
/// is re-validated against the policy and re-hashed before persistence.
///
/// # Errors
///
/// - `400 Bad Request`: unknown key or invalid value
pub async fn update_me(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(body): Json<Value>,
) -> ApiResult<Json<User>> {
    let object = body
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("Expected a JSON object".to_string()))?;

    super::ensure_allowed_keys(object, USER_UPDATE_FIELDS)?;

    let mut update = UpdateUser::default();

    if let Some(value) = object.get("name") {
        let name = value
            .as_str()
            .ok_or_else(|| field_error("name", "Name must be a string"))?
            .trim()
            .to_string();
        if name.is_empty() {
            return Err(field_error("name", "Name is required"));
        }
        update.name = Some(name);
    }

    if let Some(value) = object.get("age") {
        let age = value
            .as_i64()
            .and_then(|age| i32::try_from(age).ok())
            .filter(|age| *age >= 0)
            .ok_or_else(|| field_error("age", "Age must be a positive number"))?;
        update.age = Some(age);
    }

    if let Some(value) = object.get("password") {
        let password = value
            .as_str()
            .ok_or_else(|| field_error("password", "Password must be a string"))?
            .trim();
        validate_password(password).map_err(|msg| field_error("password", msg))?;
        // Re-hash before the write, same as registration
        update.password_hash = Some(hash_password(password)?);
    }

    let user = User::update(&state.db, session.user.id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Delete the authenticated user's account
///
/// Owned tasks are deleted first, then the account (sessions go with
/// it). The goodbye mail is fired after the deletion and never blocks
/// the response. Returns the deleted user record.
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<User>> {
    User::delete(&state.db, session.user.id).await?;

    state
        .mailer
        .send_cancellation(&session.user.email, &session.user.name);

    Ok(Json(session.user))
}

/// Upload an avatar image
///
/// Multipart field `avatar`, filename ending in jpg/jpeg/png, at most
/// 1 MB. Whatever arrives is transcoded to a 320x240 PNG before storage,
/// so the public endpoint always serves PNG.
///
/// # Errors
///
/// - `400 Bad Request`: missing field, wrong file type, too large, or
///   undecodable image data
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    mut multipart: Multipart,
) -> ApiResult<StatusCode> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("avatar") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("").to_ascii_lowercase();
        let accepted = [".jpg", ".jpeg", ".png"]
            .iter()
            .any(|ext| file_name.ends_with(ext));
        if !accepted {
            return Err(ApiError::BadRequest(
                "Please upload jpg or png file".to_string(),
            ));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        if data.len() > MAX_AVATAR_BYTES {
            return Err(ApiError::BadRequest(
                "Avatar must be 1 MB or smaller".to_string(),
            ));
        }

        let png = transcode_avatar(&data)?;
        User::set_avatar(&state.db, session.user.id, &png).await?;

        return Ok(StatusCode::OK);
    }

    Err(ApiError::BadRequest("Missing avatar field".to_string()))
}

/// Decodes an upload and re-encodes it as a 320x240 PNG
fn transcode_avatar(data: &[u8]) -> Result<Vec<u8>, ApiError> {
    let decoded = image::load_from_memory(data)
        .map_err(|e| ApiError::BadRequest(format!("Invalid image data: {}", e)))?;

    let resized = decoded.resize_exact(320, 240, image::imageops::FilterType::Triangle);

    let mut out = std::io::Cursor::new(Vec::new());
    resized
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .map_err(|e| ApiError::InternalError(format!("PNG encoding failed: {}", e)))?;

    Ok(out.into_inner())
}

/// Remove the authenticated user's avatar
pub async fn delete_avatar(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<StatusCode> {
    User::clear_avatar(&state.db, session.user.id).await?;
    Ok(StatusCode::OK)
}

/// Fetch a user's avatar image (public)
///
/// Streams the stored bytes as `image/png`. A user without an avatar and
/// a user that does not exist both produce 404.
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let avatar = User::get_avatar(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Avatar not found".to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], avatar).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "zzzzz",
            "email": "aaaaa@gmail.com",
            "password": "pass1234",
            "age": 30
        }))
        .expect("Should deserialize");
        assert!(valid.validate().is_ok());

        let bad_email: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "zzzzz",
            "email": "not-an-email",
            "password": "pass1234"
        }))
        .expect("Should deserialize");
        assert!(bad_email.validate().is_err());

        let negative_age: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "zzzzz",
            "email": "aaaaa@gmail.com",
            "password": "pass1234",
            "age": -1
        }))
        .expect("Should deserialize");
        assert!(negative_age.validate().is_err());
    }

    #[test]
    fn test_register_request_age_defaults_to_zero() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "zzzzz",
            "email": "aaaaa@gmail.com",
            "password": "pass1234"
        }))
        .expect("Should deserialize");
        assert_eq!(req.age, 0);
    }

    #[test]
    fn test_transcode_avatar_rejects_garbage() {
        let result = transcode_avatar(b"definitely not an image");
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_transcode_avatar_produces_320x240_png() {
        // Encode a small solid image, then run it through the pipeline
        let source = image::DynamicImage::new_rgb8(64, 64);
        let mut buf = std::io::Cursor::new(Vec::new());
        source
            .write_to(&mut buf, image::ImageOutputFormat::Jpeg(90))
            .expect("Should encode");

        let png = transcode_avatar(buf.get_ref()).expect("Should transcode");

        let decoded = image::load_from_memory(&png).expect("Should decode");
        assert_eq!(decoded.width(), 320);
        assert_eq!(decoded.height(), 240);
        assert_eq!(
            image::guess_format(&png).expect("Should detect format"),
            image::ImageFormat::Png
        );
    }
}
