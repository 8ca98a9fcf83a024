use axum::{extract::State, Json};

use super::notification_dto::NotificationCheckResponse;
use crate::{error::Result, middleware::AuthUser, state::AppState};

/// Poll for reminders that are due now
#[utoipa::path(
    get,
    path = "/api/notifications/check",
    responses(
        (status = 200, description = "Todos whose reminder fired on this poll", body = NotificationCheckResponse),
        (status = 401, description = "Not authenticated")
    ),
    tag = "notifications",
    security(("session_cookie" = []))
)]
pub async fn check_notifications(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<NotificationCheckResponse>> {
    let todos = state.notification_service.check(user_id).await?;
    let count = todos.len();
    Ok(Json(NotificationCheckResponse { todos, count }))
}
