use crate::{
    error::Result,
    extract::AppJson,
    middleware::AuthUser,
    state::AppState,
};
use super::auth_dto::{LoginRequest, SessionResponse};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use validator::Validate;

pub const SESSION_COOKIE: &str = "session";

/// Start a session for a username
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session cookie set", body = SessionResponse),
        (status = 400, description = "Validation error")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let (user, token) = state.auth_service.login(&payload.username).await?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(state.config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(state.auth_service.session_ttl_hours()))
        .path("/")
        .build();

    Ok((jar.add(cookie), Json(SessionResponse { user: user.into() })))
}

/// Current session user
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Current user", body = SessionResponse),
        (status = 401, description = "Not authenticated")
    ),
    tag = "auth",
    security(("session_cookie" = []))
)]
pub async fn session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SessionResponse>> {
    let user = state.auth_service.current_user(user_id).await?;
    Ok(Json(SessionResponse { user: user.into() }))
}

/// End the session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Session cookie cleared")
    ),
    tag = "auth"
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    (jar, StatusCode::NO_CONTENT)
}
