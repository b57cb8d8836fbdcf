use super::auth_dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::{
    error::{AppError, Result},
    state::AppState,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (user, token) = state
        .auth_service
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    state.activity_repository.log_detached(
        user.id,
        "ACCOUNT_CREATED",
        format!("Account registered for {}", user.email),
    );

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (user, token) = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    state
        .activity_repository
        .log_detached(user.id, "LOGIN", "Signed in".to_string());

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}
