use crate::{auth::verify_jwt, error::AppError, state::AppState};
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized("Invalid credentials".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized("Invalid credentials".to_string()))?;

    let claims = verify_jwt(token, &state.config.jwt_secret)?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    // Touch last_seen off the request path; a miss here only delays
    // inactivity detection until the user's next request.
    let users = state.user_repository.clone();
    tokio::spawn(async move {
        if let Err(e) = users.touch_last_seen(user_id).await {
            tracing::debug!("last_seen update skipped: {e}");
        }
    });

    // Handlers read the id back out with Extension<Uuid>.
    req.extensions_mut().insert(user_id);

    Ok(next.run(req).await)
}
