use std::sync::Arc;

use anyhow::{anyhow, Context};
use chrono_tz::Tz;

use crate::{
    auth::AuthService,
    db::DbPool,
    notification::NotificationService,
    schedule::AppTime,
    subtask::{SubtaskRepository, SubtaskService},
    tag::{TagRepository, TagService},
    template::{TemplateRepository, TemplateService},
    todo::{TodoRepository, TodoService},
    user::UserRepository,
};

const DEV_SESSION_SECRET: &str = "dev-only-session-secret";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub todo_service: TodoService,
    pub subtask_service: SubtaskService,
    pub tag_service: TagService,
    pub template_service: TemplateService,
    pub notification_service: NotificationService,
}

impl AppState {
    /// Wires repositories and services around one pool and one clock.
    pub fn new(db: DbPool, config: Arc<Config>, time: AppTime) -> Self {
        let user_repository = UserRepository::new(db.clone());
        let todo_repository = TodoRepository::new(db.clone());
        let subtask_repository = SubtaskRepository::new(db.clone());
        let tag_repository = TagRepository::new(db.clone());
        let template_repository = TemplateRepository::new(db.clone());

        let auth_service = AuthService::new(
            user_repository,
            config.session_secret.clone(),
            config.session_ttl_hours,
            time.clone(),
        );
        let todo_service = TodoService::new(
            db.clone(),
            todo_repository.clone(),
            subtask_repository.clone(),
            tag_repository.clone(),
            time.clone(),
        );
        let subtask_service = SubtaskService::new(
            subtask_repository.clone(),
            todo_repository.clone(),
            time.clone(),
        );
        let tag_service = TagService::new(tag_repository.clone(), time.clone());
        let template_service = TemplateService::new(
            db.clone(),
            template_repository,
            tag_repository,
            todo_service.clone(),
            time.clone(),
        );
        let notification_service = NotificationService::new(todo_repository, time.clone());

        Self {
            config,
            auth_service,
            todo_service,
            subtask_service,
            tag_service,
            template_service,
            notification_service,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub secure_cookies: bool,
    pub timezone: Tz,
    pub dev_auto_login: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let dev_auto_login = env_flag("DEV_AUTO_LOGIN")?;

        let session_secret = match std::env::var("SESSION_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if dev_auto_login => {
                tracing::warn!("SESSION_SECRET not set, using development secret");
                DEV_SESSION_SECRET.to_string()
            }
            _ => return Err(anyhow!("SESSION_SECRET must be set")),
        };

        let timezone_name =
            std::env::var("APP_TIMEZONE").unwrap_or_else(|_| "Asia/Singapore".to_string());
        let timezone = timezone_name
            .parse::<Tz>()
            .map_err(|e| anyhow!("APP_TIMEZONE '{}' is not a known timezone: {}", timezone_name, e))?;

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://todos.db".to_string()),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 5)?,
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_parse("PORT", 3000)?,
            session_secret,
            session_ttl_hours: env_parse("SESSION_TTL_HOURS", 24 * 7)?,
            secure_cookies: env_flag("SECURE_COOKIES")?,
            timezone,
            dev_auto_login,
        })
    }
}

fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a number", key)),
        Err(_) => Ok(default),
    }
}

fn env_flag(key: &str) -> anyhow::Result<bool> {
    match std::env::var(key) {
        Ok(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(anyhow!("{} must be a boolean, got '{}'", key, raw)),
        },
        Err(_) => Ok(false),
    }
}
