mod auth;
mod db;
mod error;
mod extract;
mod middleware;
mod notification;
mod patch;
mod routes;
mod schedule;
mod state;
mod subtask;
mod tag;
mod template;
mod todo;
mod user;
mod validation;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Context;
use db::{create_pool, run_migrations};
use routes::create_router;
use schedule::AppTime;
use state::{AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,todo_app=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);
    if config.dev_auto_login {
        tracing::warn!("DEV_AUTO_LOGIN is on: unauthenticated requests run as the dev user");
    }

    tracing::info!("Connecting to database...");
    let db = create_pool(&config.database_url, config.db_max_connections)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    let time = AppTime::system(config.timezone);
    tracing::info!(timezone = %config.timezone, "using app timezone");

    let state = AppState::new(db, config.clone(), time);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
