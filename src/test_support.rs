//! Shared fixtures for service and route tests.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono_tz::Asia::Singapore;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    db::test_pool,
    routes::create_router,
    schedule::{clock::testing::ManualClock, AppTime},
    state::{AppState, Config},
};

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        db_max_connections: 1,
        host: "127.0.0.1".into(),
        port: 0,
        session_secret: "test-session-secret".into(),
        session_ttl_hours: 24,
        secure_cookies: false,
        timezone: Singapore,
        dev_auto_login: false,
    }
}

pub struct TestApp {
    pub state: AppState,
    pub clock: ManualClock,
}

impl TestApp {
    pub async fn with_clock(clock: ManualClock) -> Self {
        Self::with_config(clock, test_config()).await
    }

    pub async fn with_config(clock: ManualClock, config: Config) -> Self {
        let time = AppTime::new(config.timezone, Arc::new(clock.clone()));
        let state = AppState::new(test_pool().await, Arc::new(config), time);
        Self { state, clock }
    }

    /// Creates (or finds) a user and returns its id.
    pub async fn user(&self, username: &str) -> Uuid {
        let (user, _) = self.state.auth_service.login(username).await.unwrap();
        user.id
    }

    /// Logs in and returns the session token.
    pub async fn login(&self, username: &str) -> String {
        let (_, token) = self.state.auth_service.login(username).await.unwrap();
        token
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Sends one request through the full router and decodes the JSON body
    /// (`Value::Null` when empty).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("cookie", format!("session={}", token));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}
