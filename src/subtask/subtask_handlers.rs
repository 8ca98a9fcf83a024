use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::subtask_dto::{
    CreateSubtaskRequest, DeleteSubtaskResponse, SubtaskListResponse, SubtaskResponse,
    UpdateSubtaskRequest,
};
use crate::{error::Result, extract::AppJson, middleware::AuthUser, state::AppState};

/// Subtasks of a todo with completion progress
#[utoipa::path(
    get,
    path = "/api/todos/{id}/subtasks",
    params(("id" = Uuid, Path, description = "Todo ID")),
    responses(
        (status = 200, description = "Subtasks in display order", body = SubtaskListResponse),
        (status = 404, description = "Todo not found")
    ),
    tag = "subtasks",
    security(("session_cookie" = []))
)]
pub async fn list_subtasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(todo_id): Path<Uuid>,
) -> Result<Json<SubtaskListResponse>> {
    let (subtasks, progress) = state.subtask_service.list(user_id, todo_id).await?;
    Ok(Json(SubtaskListResponse { subtasks, progress }))
}

/// Add a subtask to a todo
#[utoipa::path(
    post,
    path = "/api/todos/{id}/subtasks",
    params(("id" = Uuid, Path, description = "Todo ID")),
    request_body = CreateSubtaskRequest,
    responses(
        (status = 201, description = "Subtask created", body = SubtaskResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Todo not found")
    ),
    tag = "subtasks",
    security(("session_cookie" = []))
)]
pub async fn create_subtask(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(todo_id): Path<Uuid>,
    AppJson(payload): AppJson<CreateSubtaskRequest>,
) -> Result<(StatusCode, Json<SubtaskResponse>)> {
    let subtask = state
        .subtask_service
        .create(user_id, todo_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(SubtaskResponse { subtask })))
}

/// Update a subtask
#[utoipa::path(
    put,
    path = "/api/todos/{id}/subtasks/{subtask_id}",
    params(
        ("id" = Uuid, Path, description = "Todo ID"),
        ("subtask_id" = Uuid, Path, description = "Subtask ID")
    ),
    request_body = UpdateSubtaskRequest,
    responses(
        (status = 200, description = "Subtask updated", body = SubtaskResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Todo or subtask not found")
    ),
    tag = "subtasks",
    security(("session_cookie" = []))
)]
pub async fn update_subtask(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((todo_id, subtask_id)): Path<(Uuid, Uuid)>,
    AppJson(payload): AppJson<UpdateSubtaskRequest>,
) -> Result<Json<SubtaskResponse>> {
    let subtask = state
        .subtask_service
        .update(user_id, todo_id, subtask_id, payload)
        .await?;
    Ok(Json(SubtaskResponse { subtask }))
}

/// Delete a subtask
#[utoipa::path(
    delete,
    path = "/api/todos/{id}/subtasks/{subtask_id}",
    params(
        ("id" = Uuid, Path, description = "Todo ID"),
        ("subtask_id" = Uuid, Path, description = "Subtask ID")
    ),
    responses(
        (status = 200, description = "Subtask deleted", body = DeleteSubtaskResponse),
        (status = 404, description = "Todo or subtask not found")
    ),
    tag = "subtasks",
    security(("session_cookie" = []))
)]
pub async fn delete_subtask(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((todo_id, subtask_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DeleteSubtaskResponse>> {
    state
        .subtask_service
        .delete(user_id, todo_id, subtask_id)
        .await?;
    Ok(Json(DeleteSubtaskResponse {
        success: true,
        deleted_id: subtask_id,
    }))
}
