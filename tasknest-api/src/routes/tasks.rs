/// Task CRUD endpoints
///
/// Every handler here sits behind the bearer-auth layer, so the owning user
/// id always comes from the verified [`AuthContext`] and never from the
/// request. A task that exists but belongs to another user is reported as
/// 404, identical to a task that does not exist.
///
/// # Endpoints
///
/// - `GET /tasks` - List with pagination, status filter, and title search
/// - `POST /tasks` - Create
/// - `PATCH /tasks/:id` - Partial update (title/description/status only)
/// - `DELETE /tasks/:id` - Delete

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{validation_error, MessageResponse},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tasknest_shared::{
    auth::middleware::AuthContext,
    models::task::{CreateTask, Task, TaskFilter, TaskStatus, UpdateTask},
};
use validator::Validate;

/// Query parameters for the list endpoint
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// 1-based page number (default: 1)
    pub page: Option<i64>,

    /// Items per page (default: 5, max: 100)
    pub limit: Option<i64>,

    /// Status filter: PENDING, COMPLETED, or ALL (default: ALL)
    pub status: Option<String>,

    /// Case-insensitive substring match on the title
    pub search: Option<String>,
}

/// Pagination metadata returned alongside each page
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Total number of tasks matching the filter
    pub total_tasks: i64,

    /// ceil(totalTasks / pageSize)
    pub total_pages: i64,

    /// The requested page
    pub current_page: i64,

    /// The requested page size
    pub page_size: i64,
}

/// List response: one page of tasks plus pagination metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    /// The requested page, newest first
    pub tasks: Vec<Task>,

    /// Pagination metadata
    pub pagination: Pagination,
}

/// Create-task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title, required
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status (default: PENDING)
    pub status: Option<TaskStatus>,
}

/// Partial-update request
///
/// This typed body is the field allow-list: unknown keys are dropped during
/// deserialization and can never reach the store.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,
}

/// Computes ceil(total / page_size)
fn total_pages(total: i64, page_size: i64) -> i64 {
    (total + page_size - 1) / page_size
}

/// Parses the status query parameter
///
/// `None` and `ALL` both mean "no filter"; anything else must be a valid
/// status spelling.
fn parse_status_filter(raw: Option<&str>) -> Result<Option<TaskStatus>, ApiError> {
    match raw {
        None => Ok(None),
        Some("ALL") => Ok(None),
        Some(value) => value
            .parse::<TaskStatus>()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid status filter: {}", value))),
    }
}

/// List the caller's tasks
///
/// # Endpoint
///
/// ```text
/// GET /tasks?page=1&limit=5&status=PENDING&search=plants
/// ```
///
/// # Response
///
/// ```json
/// {
///   "tasks": [ ... ],
///   "pagination": {
///     "totalTasks": 12,
///     "totalPages": 3,
///     "currentPage": 1,
///     "pageSize": 5
///   }
/// }
/// ```
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.limit.unwrap_or(5).clamp(1, 100);
    let status = parse_status_filter(query.status.as_deref())?;

    let filter = TaskFilter {
        page,
        page_size,
        status,
        search: query.search.filter(|s| !s.is_empty()),
    };

    let (tasks, total) = Task::list(&state.db, auth.user_id, &filter).await?;

    Ok(Json(ListResponse {
        tasks,
        pagination: Pagination {
            total_tasks: total,
            total_pages: total_pages(total, page_size),
            current_page: page,
            page_size,
        },
    }))
}

/// Create a task owned by the caller
///
/// # Errors
///
/// - `400 Bad Request`: missing or empty title
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate().map_err(validation_error)?;

    let task = Task::create(
        &state.db,
        CreateTask {
            user_id: auth.user_id,
            title: req.title,
            description: req.description,
            status: req.status.unwrap_or_default(),
        },
    )
    .await?;

    tracing::debug!(user_id = auth.user_id, task_id = task.id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// Partially update one of the caller's tasks
///
/// The update is a single conditioned write scoped by id and owner, so
/// ownership cannot change between check and mutation.
///
/// # Errors
///
/// - `400 Bad Request`: empty title
/// - `404 Not Found`: task absent or owned by someone else
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    if let Some(title) = &req.title {
        if title.is_empty() {
            return Err(ApiError::BadRequest("Title cannot be empty".to_string()));
        }
    }

    let task = Task::update(
        &state.db,
        auth.user_id,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Delete one of the caller's tasks
///
/// # Errors
///
/// - `404 Not Found`: task absent or owned by someone else
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = Task::delete(&state.db, auth.user_id, id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::debug!(user_id = auth.user_id, task_id = id, "Task deleted");

    Ok(Json(MessageResponse::new("Task deleted successfully")))
}
