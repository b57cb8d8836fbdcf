use crate::activity::ActivityRepository;
use crate::auth::AuthService;
use crate::notification::{dispatch::Notifier, NotificationRepository};
use crate::task::TaskRepository;
use crate::user::UserRepository;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub user_repository: UserRepository,
    pub task_repository: TaskRepository,
    pub notification_repository: NotificationRepository,
    pub activity_repository: ActivityRepository,
    pub auth_service: AuthService,
    pub notifier: Notifier,
}

#[derive(Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub frontend_url: String,
    /// How often the deadline scanner ticks.
    pub deadline_scan_interval: Duration,
    /// How often the inactivity scanner ticks.
    pub inactivity_scan_interval: Duration,
    /// Rolling look-ahead window for deadline reminders.
    pub deadline_lookahead_hours: i64,
    /// A user idle longer than this is a candidate; also the re-notify cool-down.
    pub idle_threshold_minutes: i64,
    /// Deadline reminders always persist in-app; emailing them is opt-in.
    pub deadline_email_enabled: bool,
    pub email: Option<EmailConfig>,
}

#[derive(Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    /// Client-side cap on a single SMTP send, kept below any gateway timeout
    /// so a hung relay fails one notify attempt, not a whole scan tick.
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_expiration_hours: env_parse("JWT_EXPIRATION_HOURS", 24),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            deadline_scan_interval: Duration::from_secs(env_parse(
                "DEADLINE_SCAN_INTERVAL_SECS",
                3600,
            )),
            inactivity_scan_interval: Duration::from_secs(env_parse(
                "INACTIVITY_SCAN_INTERVAL_SECS",
                900,
            )),
            deadline_lookahead_hours: env_parse("DEADLINE_LOOKAHEAD_HOURS", 24),
            idle_threshold_minutes: env_parse("IDLE_THRESHOLD_MINUTES", 120),
            deadline_email_enabled: env_parse("DEADLINE_EMAIL_ENABLED", false),
            email: EmailConfig::from_env(),
        }
    }
}

impl EmailConfig {
    /// `None` when EMAIL_HOST is unset; the app then runs with a disabled mailer.
    fn from_env() -> Option<Self> {
        let host = std::env::var("EMAIL_HOST").ok()?;
        Some(Self {
            host,
            port: env_parse("EMAIL_PORT", 587),
            username: std::env::var("EMAIL_USER").unwrap_or_default(),
            password: std::env::var("EMAIL_PASS").unwrap_or_default(),
            from: std::env::var("EMAIL_FROM").expect("EMAIL_FROM must be set when EMAIL_HOST is"),
            timeout: Duration::from_secs(env_parse("EMAIL_TIMEOUT_SECS", 10)),
        })
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{} must be a valid value", name)),
        Err(_) => default,
    }
}
