/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Registration, login/logout, profile, and avatar endpoints
/// - `tasks`: Owner-scoped task CRUD and listing

pub mod health;
pub mod tasks;
pub mod users;

use crate::error::ApiError;
use serde_json::{Map, Value};

/// Rejects a partial-update body containing any key outside the allow-list
///
/// The check runs before any field is interpreted, so an update with one
/// bad key applies nothing at all.
pub(crate) fn ensure_allowed_keys(
    body: &Map<String, Value>,
    allowed: &[&str],
) -> Result<(), ApiError> {
    let all_allowed = body.keys().all(|key| allowed.contains(&key.as_str()));

    if !all_allowed {
        return Err(ApiError::BadRequest("Invalid keys".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().expect("Should be an object").clone()
    }

    #[test]
    fn test_allowed_keys_pass() {
        let body = as_map(json!({"name": "Ada", "age": 30}));
        assert!(ensure_allowed_keys(&body, &["name", "age", "password"]).is_ok());

        let body = as_map(json!({"completed": true}));
        assert!(ensure_allowed_keys(&body, &["description", "completed"]).is_ok());
    }

    #[test]
    fn test_unknown_key_rejects_wholesale() {
        let body = as_map(json!({"name": "Ada", "email": "ada@example.com"}));
        assert!(ensure_allowed_keys(&body, &["name", "age", "password"]).is_err());

        let body = as_map(json!({"owner": "someone-else"}));
        assert!(ensure_allowed_keys(&body, &["description", "completed"]).is_err());
    }

    #[test]
    fn test_empty_body_is_allowed() {
        let body = as_map(json!({}));
        assert!(ensure_allowed_keys(&body, &["name"]).is_ok());
    }
}
