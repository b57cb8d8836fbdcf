use crate::{
    activity::activity_handlers,
    auth::auth_handlers,
    middleware::auth_middleware,
    notification::notification_handlers,
    state::AppState,
    task::task_handlers,
    user::user_handlers,
};
use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth_handlers::register,
        auth_handlers::login,
        task_handlers::get_tasks,
        task_handlers::create_task,
        task_handlers::update_task_status,
        notification_handlers::get_notifications,
        notification_handlers::mark_notification_read,
        notification_handlers::delete_notification,
    ),
    components(
        schemas(
            crate::auth::auth_dto::RegisterRequest,
            crate::auth::auth_dto::LoginRequest,
            crate::auth::auth_dto::AuthResponse,
            crate::task::task_dto::CreateTaskRequest,
            crate::task::task_dto::UpdateTaskRequest,
            crate::task::task_dto::UpdateTaskStatusRequest,
            crate::notification::notification_dto::UpdateNotificationPreferencesRequest,
            crate::user::User,
            crate::user::UserResponse,
            crate::task::Task,
            crate::task::TaskStatus,
            crate::task::TaskPriority,
            crate::notification::Notification,
            crate::notification::NotificationKind,
            crate::activity::Activity,
        )
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "tasks", description = "Task management endpoints"),
        (name = "notifications", description = "Notification endpoints")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            )
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let auth_routes = Router::new()
        .route("/register", post(auth_handlers::register))
        .route("/login", post(auth_handlers::login));

    // Protected routes (auth required)
    let task_routes = Router::new()
        .route(
            "/",
            get(task_handlers::get_tasks).post(task_handlers::create_task),
        )
        .route(
            "/:id",
            get(task_handlers::get_task)
                .put(task_handlers::update_task)
                .delete(task_handlers::delete_task),
        )
        .route("/:id/status", patch(task_handlers::update_task_status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let notification_routes = Router::new()
        .route("/", get(notification_handlers::get_notifications))
        .route(
            "/read-all",
            patch(notification_handlers::mark_all_notifications_read),
        )
        .route(
            "/:id/read",
            patch(notification_handlers::mark_notification_read),
        )
        .route("/:id", delete(notification_handlers::delete_notification))
        .route(
            "/preferences",
            put(notification_handlers::update_notification_preferences),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let user_routes = Router::new()
        .route("/me", get(user_handlers::get_me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let activity_routes = Router::new()
        .route(
            "/",
            get(activity_handlers::get_activities).delete(activity_handlers::clear_activities),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine all routes
    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .nest("/notifications", notification_routes)
        .nest("/users", user_routes)
        .nest("/activities", activity_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
