use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::todo_dto::{
    CreateTodoRequest, PaginatedTodos, PaginatedResponse, TodoListQuery, ToggleTodoResponse,
    UpdateTodoRequest, UpdateTodoResponse,
};
use super::todo_models::{PriorityCounts, TodoDetails};
use crate::{
    error::Result,
    extract::AppJson,
    middleware::AuthUser,
    state::AppState,
    tag::tag_dto::SetTagsRequest,
    template::template_dto::{SaveAsTemplateRequest, TemplateResponse},
};

/// List todos with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/api/todos",
    params(TodoListQuery),
    responses(
        (status = 200, description = "One page of todos", body = PaginatedTodos),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "todos",
    security(("session_cookie" = []))
)]
pub async fn list_todos(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<TodoListQuery>,
) -> Result<Json<PaginatedResponse<TodoDetails>>> {
    let page = state.todo_service.list(user_id, query).await?;
    Ok(Json(page))
}

/// Count incomplete todos per priority
#[utoipa::path(
    get,
    path = "/api/todos/priority-counts",
    responses(
        (status = 200, description = "Counts per priority", body = PriorityCounts)
    ),
    tag = "todos",
    security(("session_cookie" = []))
)]
pub async fn priority_counts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PriorityCounts>> {
    let counts = state.todo_service.priority_counts(user_id).await?;
    Ok(Json(counts))
}

/// Create a todo
#[utoipa::path(
    post,
    path = "/api/todos",
    request_body = CreateTodoRequest,
    responses(
        (status = 201, description = "Todo created", body = TodoDetails),
        (status = 400, description = "Validation error")
    ),
    tag = "todos",
    security(("session_cookie" = []))
)]
pub async fn create_todo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreateTodoRequest>,
) -> Result<(StatusCode, Json<TodoDetails>)> {
    let todo = state.todo_service.create(user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

/// Get a todo with subtasks and tags
#[utoipa::path(
    get,
    path = "/api/todos/{id}",
    params(("id" = Uuid, Path, description = "Todo ID")),
    responses(
        (status = 200, description = "Todo found", body = TodoDetails),
        (status = 404, description = "Todo not found")
    ),
    tag = "todos",
    security(("session_cookie" = []))
)]
pub async fn get_todo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TodoDetails>> {
    let todo = state.todo_service.get(user_id, id).await?;
    Ok(Json(todo))
}

/// Partially update a todo
#[utoipa::path(
    put,
    path = "/api/todos/{id}",
    params(("id" = Uuid, Path, description = "Todo ID")),
    request_body = UpdateTodoRequest,
    responses(
        (status = 200, description = "Todo updated", body = UpdateTodoResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Todo not found")
    ),
    tag = "todos",
    security(("session_cookie" = []))
)]
pub async fn update_todo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateTodoRequest>,
) -> Result<Json<UpdateTodoResponse>> {
    let (todo, next_todo) = state.todo_service.update(user_id, id, payload).await?;
    Ok(Json(UpdateTodoResponse { todo, next_todo }))
}

/// Toggle completion
#[utoipa::path(
    post,
    path = "/api/todos/{id}/toggle",
    params(("id" = Uuid, Path, description = "Todo ID")),
    responses(
        (status = 200, description = "Completion flipped", body = ToggleTodoResponse),
        (status = 404, description = "Todo not found")
    ),
    tag = "todos",
    security(("session_cookie" = []))
)]
pub async fn toggle_todo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ToggleTodoResponse>> {
    let (todo, next_todo) = state.todo_service.toggle(user_id, id).await?;
    Ok(Json(ToggleTodoResponse { todo, next_todo }))
}

/// Delete a todo
#[utoipa::path(
    delete,
    path = "/api/todos/{id}",
    params(("id" = Uuid, Path, description = "Todo ID")),
    responses(
        (status = 204, description = "Todo deleted"),
        (status = 404, description = "Todo not found")
    ),
    tag = "todos",
    security(("session_cookie" = []))
)]
pub async fn delete_todo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.todo_service.delete(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the tags on a todo
#[utoipa::path(
    put,
    path = "/api/todos/{id}/tags",
    params(("id" = Uuid, Path, description = "Todo ID")),
    request_body = SetTagsRequest,
    responses(
        (status = 200, description = "Tags replaced", body = TodoDetails),
        (status = 400, description = "Unknown tag"),
        (status = 404, description = "Todo not found")
    ),
    tag = "todos",
    security(("session_cookie" = []))
)]
pub async fn set_todo_tags(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<SetTagsRequest>,
) -> Result<Json<TodoDetails>> {
    let todo = state
        .todo_service
        .set_tags(user_id, id, &payload.tag_ids)
        .await?;
    Ok(Json(todo))
}

/// Save a todo as a reusable template
#[utoipa::path(
    post,
    path = "/api/todos/{id}/save-as-template",
    params(("id" = Uuid, Path, description = "Todo ID")),
    request_body = SaveAsTemplateRequest,
    responses(
        (status = 201, description = "Template created", body = TemplateResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Todo not found")
    ),
    tag = "todos",
    security(("session_cookie" = []))
)]
pub async fn save_as_template(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<SaveAsTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateResponse>)> {
    let template = state
        .template_service
        .save_from_todo(user_id, id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(TemplateResponse { template })))
}
