/// Task model and ownership-scoped database operations
///
/// Tasks are the core entity of TaskNest. Every read and write in this module
/// is constrained by the owning user id: a task that does not match both id
/// and owner behaves exactly like a task that does not exist, so handlers
/// report 404 rather than leaking existence to non-owners.
///
/// Update and delete are single conditioned statements
/// (`WHERE id = $1 AND user_id = $2`), so the ownership check and the
/// mutation cannot race.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('PENDING', 'COMPLETED');
///
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'PENDING',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tasknest_shared::models::task::{CreateTask, Task, TaskFilter, TaskStatus};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, user_id: i64) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     user_id,
///     title: "Water the plants".to_string(),
///     description: None,
///     status: TaskStatus::Pending,
/// }).await?;
///
/// let (tasks, total) = Task::list(&pool, user_id, &TaskFilter::default()).await?;
/// assert!(total >= 1);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;

/// Task completion status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    /// Task has not been completed yet (the default)
    Pending,

    /// Task is done
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl TaskStatus {
    /// Returns the wire/database spelling of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TaskStatus::Pending),
            "COMPLETED" => Ok(TaskStatus::Completed),
            _ => Err(()),
        }
    }
}

/// Task row, serialized in camelCase on the wire
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task id
    pub id: i64,

    /// Owning user id
    pub user_id: i64,

    /// Task title
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Completion status
    pub status: TaskStatus,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Owning user id (from the authenticated session, never the body)
    pub user_id: i64,

    /// Task title, required
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status; callers default this to `Pending` when omitted
    pub status: TaskStatus,
}

/// The explicit allow-list of updatable fields
///
/// Only non-None fields are written. An absent field leaves the stored value
/// unchanged; nothing outside title/description/status can ever reach the
/// store.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,
}

impl UpdateTask {
    /// True when no field is set (the update is a no-op)
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }
}

/// Filter and pagination parameters for listing tasks
#[derive(Debug, Clone)]
pub struct TaskFilter {
    /// 1-based page number
    pub page: i64,

    /// Items per page
    pub page_size: i64,

    /// Exact status match; `None` means no status filter
    pub status: Option<TaskStatus>,

    /// Case-insensitive substring match on the title
    pub search: Option<String>,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 5,
            status: None,
            search: None,
        }
    }
}

impl TaskFilter {
    /// Row offset for the requested page
    ///
    /// Saturates rather than overflowing, so an absurd page number yields an
    /// empty page instead of a panic or a negative OFFSET.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// Escapes LIKE metacharacters so a search term always matches literally
///
/// Without this, searching for `%` or `_` would match every title.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl Task {
    /// Creates a task owned by `data.user_id`
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, title, description, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, description, status, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .fetch_one(pool)
        .await
    }

    /// Lists one page of the user's tasks plus the total matching count
    ///
    /// Always constrained by owner; optionally constrained by exact status
    /// and by case-insensitive title substring (the term is matched
    /// literally, LIKE wildcards carry no meaning). Ordered newest-first with the
    /// id as a stable tiebreak, so concatenating consecutive pages yields
    /// every matching task exactly once.
    pub async fn list(
        pool: &PgPool,
        user_id: i64,
        filter: &TaskFilter,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let search = filter.search.as_deref().map(escape_like);

        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, status, created_at
            FROM tasks
            WHERE user_id = $1
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR title ILIKE '%' || $3 || '%')
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(filter.status)
        .bind(search.as_deref())
        .bind(filter.page_size)
        .bind(filter.offset())
        .fetch_all(pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM tasks
            WHERE user_id = $1
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR title ILIKE '%' || $3 || '%')
            "#,
        )
        .bind(user_id)
        .bind(filter.status)
        .bind(search.as_deref())
        .fetch_one(pool)
        .await?;

        Ok((tasks, total))
    }

    /// Fetches a single task scoped to its owner
    pub async fn find_scoped(
        pool: &PgPool,
        user_id: i64,
        task_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, status, created_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Applies a partial update as one conditioned write
    ///
    /// Builds the SET clause from the non-None fields and constrains the
    /// write by both id and owner, returning the updated row. `None` means
    /// the task does not exist or belongs to someone else; callers map that
    /// to 404 without distinguishing the two.
    pub async fn update(
        pool: &PgPool,
        user_id: i64,
        task_id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_scoped(pool, user_id, task_id).await;
        }

        let mut assignments = Vec::new();
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            assignments.push(format!("title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            assignments.push(format!("description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            assignments.push(format!("status = ${}", bind_count));
        }

        let query = format!(
            "UPDATE tasks SET {} WHERE id = $1 AND user_id = $2 \
             RETURNING id, user_id, title, description, status, created_at",
            assignments.join(", ")
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(task_id).bind(user_id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a task as one conditioned write
    ///
    /// Returns true if a row was deleted, false if the task did not exist or
    /// belonged to someone else.
    pub async fn delete(pool: &PgPool, user_id: i64, task_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Pending).unwrap(),
            "\"PENDING\""
        );
        assert_eq!(
            serde_json::to_string(&TaskStatus::Completed).unwrap(),
            "\"COMPLETED\""
        );
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("PENDING".parse(), Ok(TaskStatus::Pending));
        assert_eq!("COMPLETED".parse(), Ok(TaskStatus::Completed));
        assert!("ALL".parse::<TaskStatus>().is_err());
        assert!("pending".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_status_defaults_to_pending() {
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
    }

    #[test]
    fn test_filter_offset() {
        let filter = TaskFilter::default();
        assert_eq!(filter.offset(), 0);

        let filter = TaskFilter {
            page: 3,
            page_size: 5,
            ..Default::default()
        };
        assert_eq!(filter.offset(), 10);
    }

    #[test]
    fn test_filter_offset_saturates() {
        let filter = TaskFilter {
            page: i64::MAX,
            page_size: 5,
            ..Default::default()
        };
        assert_eq!(filter.offset(), i64::MAX);
        assert!(filter.offset() >= 0);
    }

    #[test]
    fn test_escape_like_metacharacters() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("%_\\"), "\\%\\_\\\\");
    }

    #[test]
    fn test_update_emptiness() {
        assert!(UpdateTask::default().is_empty());
        assert!(!UpdateTask {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let task = Task {
            id: 1,
            user_id: 2,
            title: "T1".to_string(),
            description: None,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["userId"], 2);
        assert_eq!(value["status"], "PENDING");
        assert!(value.get("createdAt").is_some());
    }
}
