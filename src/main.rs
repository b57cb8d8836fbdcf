mod activity;
mod auth;
mod db;
mod email;
mod error;
mod middleware;
mod notification;
mod routes;
mod scheduler;
mod state;
mod task;
mod user;

use db::{create_pool, run_migrations};
use email::{DisabledMailer, Mailer, SmtpMailer};
use notification::dispatch::Notifier;
use routes::create_router;
use scheduler::start_scheduler;
use state::{AppState, Config};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,taskflow=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());

    // Create database connection pool
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    tracing::info!("Connecting to database...");
    let db = create_pool(&database_url).await?;

    // Run migrations
    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    // Create repositories
    let user_repository = user::UserRepository::new(db.clone());
    let task_repository = task::TaskRepository::new(db.clone());
    let notification_repository = notification::NotificationRepository::new(db.clone());
    let activity_repository = activity::ActivityRepository::new(db.clone());

    // Outbound email: real SMTP when configured, disabled otherwise
    let mailer: Arc<dyn Mailer> = match &config.email {
        Some(email_config) => Arc::new(SmtpMailer::new(email_config)?),
        None => {
            tracing::warn!("EMAIL_HOST not set; email notifications disabled");
            Arc::new(DisabledMailer)
        }
    };

    let notifier = Notifier::new(
        Arc::new(notification_repository.clone()),
        mailer,
        config.frontend_url.clone(),
        config.deadline_email_enabled,
    );

    let auth_service = auth::AuthService::new(
        user_repository.clone(),
        config.jwt_secret.clone(),
        config.jwt_expiration_hours,
    );

    // Create application state
    let state = AppState {
        config: config.clone(),
        user_repository,
        task_repository,
        notification_repository,
        activity_repository,
        auth_service,
        notifier,
    };

    // Start the background scanners
    let scheduler_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = start_scheduler(scheduler_state).await {
            tracing::error!("Scheduler error: {:?}", e);
        }
    });

    // Create router
    let app = create_router(state);

    // Start server
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
