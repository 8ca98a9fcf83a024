use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::template_dto::{
    CreateTemplateRequest, TemplateListQuery, TemplateListResponse, TemplateResponse,
    UpdateTemplateRequest, UseTemplateRequest, UseTemplateResponse,
};
use crate::{error::Result, extract::AppJson, middleware::AuthUser, state::AppState};

/// List templates, optionally by category
#[utoipa::path(
    get,
    path = "/api/templates",
    params(TemplateListQuery),
    responses(
        (status = 200, description = "Templates ordered by name", body = TemplateListResponse)
    ),
    tag = "templates",
    security(("session_cookie" = []))
)]
pub async fn list_templates(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<TemplateListQuery>,
) -> Result<Json<TemplateListResponse>> {
    let templates = state
        .template_service
        .list(user_id, query.category.as_deref())
        .await?;
    Ok(Json(TemplateListResponse { templates }))
}

/// Create a template
#[utoipa::path(
    post,
    path = "/api/templates",
    request_body = CreateTemplateRequest,
    responses(
        (status = 201, description = "Template created", body = TemplateResponse),
        (status = 400, description = "Validation error")
    ),
    tag = "templates",
    security(("session_cookie" = []))
)]
pub async fn create_template(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateResponse>)> {
    let template = state.template_service.create(user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(TemplateResponse { template })))
}

/// Get a template
#[utoipa::path(
    get,
    path = "/api/templates/{id}",
    params(("id" = Uuid, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Template found", body = TemplateResponse),
        (status = 404, description = "Template not found")
    ),
    tag = "templates",
    security(("session_cookie" = []))
)]
pub async fn get_template(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TemplateResponse>> {
    let template = state.template_service.get(user_id, id).await?;
    Ok(Json(TemplateResponse { template }))
}

/// Partially update a template
#[utoipa::path(
    put,
    path = "/api/templates/{id}",
    params(("id" = Uuid, Path, description = "Template ID")),
    request_body = UpdateTemplateRequest,
    responses(
        (status = 200, description = "Template updated", body = TemplateResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Template not found")
    ),
    tag = "templates",
    security(("session_cookie" = []))
)]
pub async fn update_template(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateTemplateRequest>,
) -> Result<Json<TemplateResponse>> {
    let template = state.template_service.update(user_id, id, payload).await?;
    Ok(Json(TemplateResponse { template }))
}

/// Delete a template
#[utoipa::path(
    delete,
    path = "/api/templates/{id}",
    params(("id" = Uuid, Path, description = "Template ID")),
    responses(
        (status = 204, description = "Template deleted"),
        (status = 404, description = "Template not found")
    ),
    tag = "templates",
    security(("session_cookie" = []))
)]
pub async fn delete_template(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.template_service.delete(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create a todo from a template
#[utoipa::path(
    post,
    path = "/api/templates/{id}/use",
    params(("id" = Uuid, Path, description = "Template ID")),
    request_body(content = UseTemplateRequest, description = "Optional; may be omitted"),
    responses(
        (status = 201, description = "Todo created", body = UseTemplateResponse),
        (status = 400, description = "Invalid due date or template needs one"),
        (status = 404, description = "Template not found")
    ),
    tag = "templates",
    security(("session_cookie" = []))
)]
pub async fn use_template(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<AppJson<UseTemplateRequest>>,
) -> Result<(StatusCode, Json<UseTemplateResponse>)> {
    let payload = payload.map(|AppJson(body)| body).unwrap_or_default();
    let (todo, message) = state
        .template_service
        .instantiate(user_id, id, payload.custom_due_date.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(UseTemplateResponse { todo, message })))
}
