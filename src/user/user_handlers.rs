use axum::{extract::State, Extension, Json};
use uuid::Uuid;

use super::user_models::UserResponse;
use crate::{
    error::{AppError, Result},
    state::AppState,
};

pub async fn get_me(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<UserResponse>> {
    let user = state
        .user_repository
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}
