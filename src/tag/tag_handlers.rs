use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::tag_dto::{CreateTagRequest, TagListResponse, TagResponse, UpdateTagRequest};
use crate::{error::Result, extract::AppJson, middleware::AuthUser, state::AppState};

/// List the caller's tags
#[utoipa::path(
    get,
    path = "/api/tags",
    responses(
        (status = 200, description = "Tags ordered by name", body = TagListResponse),
        (status = 401, description = "Not authenticated")
    ),
    tag = "tags",
    security(("session_cookie" = []))
)]
pub async fn list_tags(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<TagListResponse>> {
    let tags = state.tag_service.list(user_id).await?;
    Ok(Json(TagListResponse { tags }))
}

/// Create a tag
#[utoipa::path(
    post,
    path = "/api/tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 400, description = "Invalid or duplicate tag")
    ),
    tag = "tags",
    security(("session_cookie" = []))
)]
pub async fn create_tag(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreateTagRequest>,
) -> Result<(StatusCode, Json<TagResponse>)> {
    let tag = state.tag_service.create(user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(TagResponse { tag })))
}

/// Rename or recolor a tag
#[utoipa::path(
    put,
    path = "/api/tags/{id}",
    params(("id" = Uuid, Path, description = "Tag ID")),
    request_body = UpdateTagRequest,
    responses(
        (status = 200, description = "Tag updated", body = TagResponse),
        (status = 400, description = "Invalid or duplicate tag"),
        (status = 404, description = "Tag not found")
    ),
    tag = "tags",
    security(("session_cookie" = []))
)]
pub async fn update_tag(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateTagRequest>,
) -> Result<Json<TagResponse>> {
    let tag = state.tag_service.update(user_id, id, payload).await?;
    Ok(Json(TagResponse { tag }))
}

/// Delete a tag
#[utoipa::path(
    delete,
    path = "/api/tags/{id}",
    params(("id" = Uuid, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 404, description = "Tag not found")
    ),
    tag = "tags",
    security(("session_cookie" = []))
)]
pub async fn delete_tag(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.tag_service.delete(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
