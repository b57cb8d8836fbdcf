use axum::{extract::State, Extension, Json};
use serde_json::json;
use uuid::Uuid;

use super::activity_models::Activity;
use crate::{error::Result, state::AppState};

pub async fn get_activities(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<Activity>>> {
    let activities = state.activity_repository.find_recent(user_id).await?;
    Ok(Json(activities))
}

pub async fn clear_activities(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<serde_json::Value>> {
    state.activity_repository.clear(user_id).await?;
    Ok(Json(json!({ "message": "History cleared" })))
}
