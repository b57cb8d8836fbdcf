use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;

use super::{notification_dto::UpdateNotificationPreferencesRequest, notification_models::Notification};
use crate::{
    error::{AppError, Result},
    state::AppState,
};

/// Get the newest notifications for the authenticated user
#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "List of notifications", body = [Notification]),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn get_notifications(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<Notification>>> {
    let notifications = state
        .notification_repository
        .find_all_by_user(user_id)
        .await?;

    Ok(Json(notifications))
}

/// Mark a notification as read
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    responses(
        (status = 200, description = "Notification marked read", body = Notification),
        (status = 404, description = "Notification not found")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>> {
    let notification = state
        .notification_repository
        .mark_as_read(id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

    Ok(Json(notification))
}

pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<serde_json::Value>> {
    state.notification_repository.mark_all_read(user_id).await?;

    Ok(Json(json!({ "message": "All notifications marked as read" })))
}

/// Delete a notification
#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 404, description = "Notification not found")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let rows_affected = state.notification_repository.delete(id, user_id).await?;

    if rows_affected == 0 {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_notification_preferences(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
    Json(payload): Json<UpdateNotificationPreferencesRequest>,
) -> Result<Json<serde_json::Value>> {
    state
        .user_repository
        .update_notification_preferences(user_id, payload.notification_enabled)
        .await?;

    Ok(Json(json!({
        "notification_enabled": payload.notification_enabled
    })))
}
