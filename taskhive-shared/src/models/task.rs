/// Task model and owner-scoped database operations
///
/// Every read, update, and delete filters on `(id, owner_id)` in a
/// single statement; there is no fetch-by-id-then-check-owner step
/// anywhere. A task that exists but belongs to someone else is therefore
/// indistinguishable from a task that does not exist, which is exactly
/// what the API reports in both cases.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     description TEXT NOT NULL,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     owner_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task record owned by exactly one user
///
/// The owner is fixed at creation; no operation updates it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID (UUID v4)
    pub id: Uuid,

    /// What needs doing (non-empty, trimmed)
    pub description: String,

    /// Whether the task is done
    pub completed: bool,

    /// The owning user's id
    pub owner_id: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Description (already trimmed by the caller)
    pub description: String,

    /// Initial completion state
    pub completed: bool,

    /// The creating caller's user id
    pub owner_id: Uuid,
}

/// Input for a partial task update
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    /// New description
    pub description: Option<String>,

    /// New completion state
    pub completed: Option<bool>,
}

/// The columns a task listing may be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortKey {
    CreatedAt,
    UpdatedAt,
    Description,
    Completed,
}

impl TaskSortKey {
    /// Maps the client-facing key to its column name
    fn as_column(&self) -> &'static str {
        match self {
            TaskSortKey::CreatedAt => "created_at",
            TaskSortKey::UpdatedAt => "updated_at",
            TaskSortKey::Description => "description",
            TaskSortKey::Completed => "completed",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "createdAt" => Some(TaskSortKey::CreatedAt),
            "updatedAt" => Some(TaskSortKey::UpdatedAt),
            "description" => Some(TaskSortKey::Description),
            "completed" => Some(TaskSortKey::Completed),
            _ => None,
        }
    }
}

/// Sort direction for task listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A parsed `sortedBy` value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSort {
    pub key: TaskSortKey,
    pub direction: SortDirection,
}

impl TaskSort {
    /// Parses a `field:direction` pair, e.g. `createdAt:desc`
    ///
    /// Any direction other than `asc` means descending. An unknown field
    /// yields None, which listings treat as "no sort requested".
    pub fn parse(raw: &str) -> Option<Self> {
        let (field, direction) = match raw.split_once(':') {
            Some((field, direction)) => (field, direction),
            None => (raw, ""),
        };

        let key = TaskSortKey::parse(field)?;
        let direction = if direction == "asc" {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        };

        Some(TaskSort { key, direction })
    }
}

/// Filter, sort, and pagination options for a task listing
///
/// Built from raw query-string values; every value that fails to parse
/// simply behaves as if it were absent. A listing never fails because of
/// a bad query parameter.
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    /// Equality filter on `completed`
    pub completed: Option<bool>,

    /// Single-key sort
    pub sort: Option<TaskSort>,

    /// Maximum number of rows to return
    pub limit: Option<i64>,

    /// Number of rows to skip before returning
    pub skip: Option<i64>,
}

impl TaskListQuery {
    /// Builds a listing query from raw query-string parameters
    pub fn from_raw(
        completed: Option<&str>,
        sorted_by: Option<&str>,
        limit: Option<&str>,
        skip: Option<&str>,
    ) -> Self {
        Self {
            // Presence turns the filter on; only the literal "true" is true
            completed: completed.map(|value| value == "true"),
            sort: sorted_by.and_then(TaskSort::parse),
            limit: limit.and_then(|v| v.parse().ok()).filter(|v| *v >= 0),
            skip: skip.and_then(|v| v.parse().ok()).filter(|v| *v >= 0),
        }
    }
}

const TASK_COLUMNS: &str = "id, description, completed, owner_id, created_at, updated_at";

impl Task {
    /// Creates a new task for its owner
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (description, completed, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, description, completed, owner_id, created_at, updated_at
            "#,
        )
        .bind(data.description)
        .bind(data.completed)
        .bind(data.owner_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by id, visible only to its owner
    ///
    /// Returns None for a nonexistent id and for someone else's task
    /// alike.
    pub async fn find_owned(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Applies a partial update to an owned task
    ///
    /// The owner predicate is part of the UPDATE itself, so a non-owner
    /// can never modify the row. Returns the updated task, or None when
    /// no owned task matched.
    pub async fn update_owned(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", completed = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND owner_id = $2 RETURNING {TASK_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(owner_id);

        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(completed) = data.completed {
            q = q.bind(completed);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes an owned task and returns it
    ///
    /// Returns None when no owned task matched, which the API reports as
    /// not found regardless of whether the id exists for someone else.
    pub async fn delete_owned(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "DELETE FROM tasks WHERE id = $1 AND owner_id = $2 RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists an owner's tasks with filter, sort, and pagination
    ///
    /// Only the owner's tasks are ever visible. Without an explicit sort
    /// the listing comes back in creation order.
    pub async fn list_owned(
        pool: &PgPool,
        owner_id: Uuid,
        query: &TaskListQuery,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = $1");
        let mut bind_count = 1;

        if query.completed.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" AND completed = ${}", bind_count));
        }

        // Sort columns come from the TaskSortKey enum, never from the
        // request string.
        match query.sort {
            Some(sort) => sql.push_str(&format!(
                " ORDER BY {} {}",
                sort.key.as_column(),
                sort.direction.as_sql()
            )),
            None => sql.push_str(" ORDER BY created_at ASC"),
        }

        if query.limit.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" LIMIT ${}", bind_count));
        }
        if query.skip.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" OFFSET ${}", bind_count));
        }

        let mut q = sqlx::query_as::<_, Task>(&sql).bind(owner_id);

        if let Some(completed) = query.completed {
            q = q.bind(completed);
        }
        if let Some(limit) = query.limit {
            q = q.bind(limit);
        }
        if let Some(skip) = query.skip {
            q = q.bind(skip);
        }

        let tasks = q.fetch_all(pool).await?;

        Ok(tasks)
    }

    /// Deletes every task an owner holds
    ///
    /// The account-deletion cascade calls this immediately before
    /// removing the user row.
    pub async fn delete_all_owned(pool: &PgPool, owner_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE owner_id = $1")
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parse_full_form() {
        let sort = TaskSort::parse("createdAt:asc").expect("Should parse");
        assert_eq!(sort.key, TaskSortKey::CreatedAt);
        assert_eq!(sort.direction, SortDirection::Asc);

        let sort = TaskSort::parse("completed:desc").expect("Should parse");
        assert_eq!(sort.key, TaskSortKey::Completed);
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_sort_parse_defaults_to_descending() {
        let sort = TaskSort::parse("updatedAt").expect("Should parse");
        assert_eq!(sort.direction, SortDirection::Desc);

        // Anything that isn't "asc" means descending
        let sort = TaskSort::parse("updatedAt:down").expect("Should parse");
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_sort_parse_unknown_field() {
        assert!(TaskSort::parse("banana:asc").is_none());
        assert!(TaskSort::parse("").is_none());
    }

    #[test]
    fn test_list_query_from_raw() {
        let query = TaskListQuery::from_raw(
            Some("true"),
            Some("createdAt:desc"),
            Some("10"),
            Some("20"),
        );

        assert_eq!(query.completed, Some(true));
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.skip, Some(20));
        let sort = query.sort.expect("Should have sort");
        assert_eq!(sort.key, TaskSortKey::CreatedAt);
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_list_query_completed_filter_values() {
        assert_eq!(TaskListQuery::from_raw(Some("true"), None, None, None).completed, Some(true));
        assert_eq!(TaskListQuery::from_raw(Some("false"), None, None, None).completed, Some(false));
        // Present but not "true" filters for incomplete tasks
        assert_eq!(TaskListQuery::from_raw(Some("maybe"), None, None, None).completed, Some(false));
        assert_eq!(TaskListQuery::from_raw(None, None, None, None).completed, None);
    }

    #[test]
    fn test_list_query_bad_numbers_behave_as_unset() {
        let query = TaskListQuery::from_raw(None, None, Some("ten"), Some("-3"));
        assert_eq!(query.limit, None);
        assert_eq!(query.skip, None);
    }

    #[test]
    fn test_task_serialization_shape() {
        let task = Task {
            id: Uuid::new_v4(),
            description: "Buy milk".to_string(),
            completed: false,
            owner_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&task).expect("Should serialize");
        assert_eq!(json["description"], "Buy milk");
        assert_eq!(json["completed"], false);
        assert!(json.get("owner_id").is_some());
    }
}
