use axum::{routing::get, Router};

use super::notification_handlers::check_notifications;
use crate::state::AppState;

pub fn notification_routes() -> Router<AppState> {
    Router::new().route("/check", get(check_notifications))
}
