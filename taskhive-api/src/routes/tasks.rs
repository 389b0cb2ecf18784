/// Task endpoints
///
/// All task endpoints run behind the auth middleware, and every database
/// operation they trigger filters on the caller's id. A task belonging
/// to someone else is reported exactly like a task that does not exist.
///
/// # Endpoints
///
/// - `POST /tasks` - Create a task owned by the caller
/// - `GET /tasks` - List own tasks (`completed`, `sortedBy`, `limit`, `skip`)
/// - `GET /task/:id` - One own task
/// - `PATCH /task/:id` - Partial update (description, completed)
/// - `DELETE /task/:id` - Delete and return one own task

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;
use taskhive_shared::{
    auth::middleware::AuthSession,
    models::task::{CreateTask, Task, TaskListQuery, UpdateTask},
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};

/// Fields a task update may touch
const TASK_UPDATE_FIELDS: &[&str] = &["description", "completed"];

/// Create task request
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    /// What needs doing
    pub description: String,

    /// Initial completion state, defaults to false
    #[serde(default)]
    pub completed: bool,
}

/// Raw query parameters for a task listing
///
/// Everything arrives as a string; parsing is lenient and a value that
/// fails to parse behaves as if it were absent.
#[derive(Debug, Deserialize, Default)]
pub struct ListTasksParams {
    /// Equality filter on completion ("true" selects completed tasks)
    pub completed: Option<String>,

    /// `field:direction` sort, e.g. `createdAt:desc`
    #[serde(rename = "sortedBy")]
    pub sorted_by: Option<String>,

    /// Page size
    pub limit: Option<String>,

    /// Rows to skip before the page starts
    pub skip: Option<String>,
}

fn description_error() -> ApiError {
    ApiError::ValidationError(vec![ValidationErrorDetail {
        field: "description".to_string(),
        message: "Description is required".to_string(),
    }])
}

/// Create a task owned by the caller
///
/// # Errors
///
/// - `400 Bad Request`: empty description
pub async fn create_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let description = req.description.trim().to_string();
    if description.is_empty() {
        return Err(description_error());
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            description,
            completed: req.completed,
            owner_id: session.user.id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// List the caller's tasks
///
/// ```text
/// GET /tasks?completed=true
/// GET /tasks?limit=10&skip=10
/// GET /tasks?sortedBy=createdAt:desc
/// ```
///
/// Only the caller's tasks are ever in the result, whatever the
/// parameters say.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Query(params): Query<ListTasksParams>,
) -> ApiResult<Json<Vec<Task>>> {
    let query = TaskListQuery::from_raw(
        params.completed.as_deref(),
        params.sorted_by.as_deref(),
        params.limit.as_deref(),
        params.skip.as_deref(),
    );

    let tasks = Task::list_owned(&state.db, session.user.id, &query).await?;

    Ok(Json(tasks))
}

/// Fetch one of the caller's tasks
///
/// # Errors
///
/// - `404 Not Found`: no such task, or the task belongs to someone else
///   (the two are indistinguishable)
pub async fn get_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_owned(&state.db, id, session.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Partial task update
///
/// Accepts only `description` and `completed`; any other key rejects the
/// whole body before anything is written.
///
/// # Errors
///
/// - `400 Bad Request`: unknown key or invalid value
/// - `404 Not Found`: no owned task with that id
pub async fn update_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Task>> {
    let object = body
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("Expected a JSON object".to_string()))?;

    super::ensure_allowed_keys(object, TASK_UPDATE_FIELDS)?;

    let mut update = UpdateTask::default();

    if let Some(value) = object.get("description") {
        let description = value
            .as_str()
            .ok_or_else(|| description_error())?
            .trim()
            .to_string();
        if description.is_empty() {
            return Err(description_error());
        }
        update.description = Some(description);
    }

    if let Some(value) = object.get("completed") {
        let completed = value.as_bool().ok_or_else(|| {
            ApiError::ValidationError(vec![ValidationErrorDetail {
                field: "completed".to_string(),
                message: "Completed must be a boolean".to_string(),
            }])
        })?;
        update.completed = Some(completed);
    }

    let task = Task::update_owned(&state.db, id, session.user.id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Delete one of the caller's tasks and return it
///
/// # Errors
///
/// - `404 Not Found`: no owned task with that id
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::delete_owned(&state.db, id, session.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_task_request_defaults() {
        let req: CreateTaskRequest =
            serde_json::from_value(serde_json::json!({"description": "Buy milk"}))
                .expect("Should deserialize");
        assert!(!req.completed);
    }

    #[test]
    fn test_list_params_deserialize_renamed_key() {
        let params: ListTasksParams = serde_json::from_value(serde_json::json!({
            "completed": "true",
            "sortedBy": "createdAt:asc",
            "limit": "5",
            "skip": "10"
        }))
        .expect("Should deserialize");

        assert_eq!(params.sorted_by.as_deref(), Some("createdAt:asc"));
        assert_eq!(params.limit.as_deref(), Some("5"));
    }
}
