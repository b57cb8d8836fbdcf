use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{
    task_dto::{CreateTaskRequest, UpdateTaskRequest, UpdateTaskStatusRequest},
    task_models::{Task, TaskStatus},
};
use crate::{
    error::{AppError, Result},
    notification::dispatch::NotifyEvent,
    state::AppState,
};

#[derive(Deserialize)]
pub struct TaskQuery {
    status: Option<String>,
    priority: Option<String>,
    category: Option<String>,
}

/// Get all tasks for the authenticated user
#[utoipa::path(
    get,
    path = "/api/tasks",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("priority" = Option<String>, Query, description = "Filter by priority"),
        ("category" = Option<String>, Query, description = "Filter by category")
    ),
    responses(
        (status = 200, description = "List of tasks", body = [Task]),
        (status = 401, description = "Unauthorized")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn get_tasks(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<TaskQuery>,
) -> Result<Json<Vec<Task>>> {
    let filters = crate::task::task_repository::TaskFilters {
        status: query.status,
        priority: query.priority,
        category: query.category,
    };

    let tasks = state.task_repository.find_all(user_id, filters).await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Task>> {
    let task = state
        .task_repository
        .find_by_id(task_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Create a new task
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let task = state.task_repository.create(user_id, &payload).await?;

    state.activity_repository.log_detached(
        user_id,
        "TASK_CREATED",
        format!("Created task \"{}\"", task.title),
    );
    notify_owner(
        &state,
        user_id,
        NotifyEvent::TaskCreated {
            task_id: task.id,
            task_title: task.title.clone(),
        },
    );

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let task = state
        .task_repository
        .update(task_id, user_id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Path(task_id): Path<Uuid>,
) -> Result<StatusCode> {
    let rows_affected = state.task_repository.delete(task_id, user_id).await?;

    if rows_affected == 0 {
        return Err(AppError::NotFound("Task not found".to_string()));
    }

    state
        .activity_repository
        .log_detached(user_id, "TASK_DELETED", "Deleted a task".to_string());

    Ok(StatusCode::NO_CONTENT)
}

/// Update only the status of a task
#[utoipa::path(
    patch,
    path = "/api/tasks/{id}/status",
    request_body = UpdateTaskStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Task),
        (status = 404, description = "Task not found")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTaskStatusRequest>,
) -> Result<Json<Task>> {
    let task = state
        .task_repository
        .update_status(task_id, user_id, payload.status)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    if task.status == TaskStatus::Completed {
        notify_owner(
            &state,
            user_id,
            NotifyEvent::TaskCompleted {
                task_id: task.id,
                task_title: task.title.clone(),
            },
        );
    }

    Ok(Json(task))
}

/// Task-mutation notifications run off the request path; a miss here is
/// logged and never fails the request.
fn notify_owner(state: &AppState, user_id: Uuid, event: NotifyEvent) {
    let users = state.user_repository.clone();
    let notifier = state.notifier.clone();

    tokio::spawn(async move {
        let owner = match users.find_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                tracing::debug!("owner lookup for task notification skipped: {e}");
                return;
            }
        };

        if let Err(e) = notifier.notify(&owner, event).await {
            tracing::warn!(user = %user_id, "task notification failed: {e}");
        }
    });
}
