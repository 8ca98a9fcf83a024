use crate::{
    auth::{self, routes::auth_routes},
    middleware::auth_middleware,
    notification::{self, routes::notification_routes},
    schedule::RecurrencePattern,
    state::AppState,
    subtask,
    tag::{self, routes::tag_routes},
    template::{self, routes::template_routes},
    todo::{self, routes::todo_routes},
    user::UserResponse,
};
use axum::{middleware, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::auth_handlers::login,
        auth::auth_handlers::session,
        auth::auth_handlers::logout,
        todo::todo_handlers::list_todos,
        todo::todo_handlers::priority_counts,
        todo::todo_handlers::create_todo,
        todo::todo_handlers::get_todo,
        todo::todo_handlers::update_todo,
        todo::todo_handlers::toggle_todo,
        todo::todo_handlers::delete_todo,
        todo::todo_handlers::set_todo_tags,
        todo::todo_handlers::save_as_template,
        subtask::subtask_handlers::list_subtasks,
        subtask::subtask_handlers::create_subtask,
        subtask::subtask_handlers::update_subtask,
        subtask::subtask_handlers::delete_subtask,
        tag::tag_handlers::list_tags,
        tag::tag_handlers::create_tag,
        tag::tag_handlers::update_tag,
        tag::tag_handlers::delete_tag,
        template::template_handlers::list_templates,
        template::template_handlers::create_template,
        template::template_handlers::get_template,
        template::template_handlers::update_template,
        template::template_handlers::delete_template,
        template::template_handlers::use_template,
        notification::notification_handlers::check_notifications,
    ),
    components(
        schemas(
            auth::auth_dto::LoginRequest,
            auth::auth_dto::SessionResponse,
            UserResponse,
            RecurrencePattern,
            todo::Priority,
            todo::Todo,
            todo::TodoDetails,
            todo::todo_models::PriorityCounts,
            todo::todo_dto::CreateTodoRequest,
            todo::todo_dto::UpdateTodoRequest,
            todo::todo_dto::UpdateTodoResponse,
            todo::todo_dto::ToggleTodoResponse,
            todo::todo_dto::PaginatedTodos,
            subtask::Subtask,
            subtask::SubtaskProgress,
            subtask::subtask_dto::CreateSubtaskRequest,
            subtask::subtask_dto::UpdateSubtaskRequest,
            subtask::subtask_dto::SubtaskListResponse,
            subtask::subtask_dto::SubtaskResponse,
            subtask::subtask_dto::DeleteSubtaskResponse,
            tag::Tag,
            tag::tag_dto::CreateTagRequest,
            tag::tag_dto::UpdateTagRequest,
            tag::tag_dto::SetTagsRequest,
            tag::tag_dto::TagListResponse,
            tag::tag_dto::TagResponse,
            template::Template,
            template::template_models::TemplateSubtask,
            template::template_dto::TemplateSubtaskInput,
            template::template_dto::CreateTemplateRequest,
            template::template_dto::UpdateTemplateRequest,
            template::template_dto::SaveAsTemplateRequest,
            template::template_dto::UseTemplateRequest,
            template::template_dto::TemplateListResponse,
            template::template_dto::TemplateResponse,
            template::template_dto::UseTemplateResponse,
            notification::notification_dto::DueReminder,
            notification::notification_dto::NotificationCheckResponse,
        )
    ),
    tags(
        (name = "auth", description = "Stub cookie session"),
        (name = "todos", description = "Todo management"),
        (name = "subtasks", description = "Checklist items of a todo"),
        (name = "tags", description = "Tag management"),
        (name = "templates", description = "Reusable todo blueprints"),
        (name = "notifications", description = "Reminder polling")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Cookie(
                        utoipa::openapi::security::ApiKeyValue::new(
                            auth::auth_handlers::SESSION_COOKIE,
                        ),
                    ),
                ),
            )
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Everything except login/logout requires a session
    let protected = Router::new()
        .nest("/todos", todo_routes())
        .nest("/tags", tag_routes())
        .nest("/templates", template_routes())
        .nest("/notifications", notification_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .merge(protected);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use chrono::{DateTime, Duration, Utc};
    use serde_json::json;

    use crate::{
        schedule::clock::testing::ManualClock,
        test_support::{test_config, TestApp},
    };

    fn utc(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    async fn app() -> TestApp {
        TestApp::with_clock(ManualClock::new(utc("2025-03-01T09:00:00+08:00"))).await
    }

    #[tokio::test]
    async fn test_requests_without_session_are_rejected() {
        let app = app().await;
        let (status, body) = app.request(Method::GET, "/api/todos", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, _) = app
            .request(Method::GET, "/api/todos", Some("forged"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_dev_auto_login_uses_dev_user() {
        let config = crate::state::Config {
            dev_auto_login: true,
            ..test_config()
        };
        let app =
            TestApp::with_config(ManualClock::new(utc("2025-03-01T09:00:00+08:00")), config).await;

        let (status, body) = app.request(Method::GET, "/api/auth/session", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "dev-user");
    }

    #[tokio::test]
    async fn test_login_sets_session_cookie() {
        use tower::ServiceExt;

        let app = app().await;
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(json!({"username": "judy"}).to_string()))
            .unwrap();
        let response = app.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get("set-cookie")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));

        let token = cookie
            .trim_start_matches("session=")
            .split(';')
            .next()
            .unwrap();
        let (status, body) = app
            .request(Method::GET, "/api/auth/session", Some(token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "judy");
    }

    #[tokio::test]
    async fn test_weekly_completion_over_http() {
        let app = app().await;
        let token = app.login("kim").await;
        let token = Some(token.as_str());

        let (status, created) = app
            .request(
                Method::POST,
                "/api/todos",
                token,
                Some(json!({
                    "title": "Team sync",
                    "due_date": "2025-03-10T09:00",
                    "recurrence_pattern": "weekly",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["due_date"], "2025-03-10T01:00:00Z");
        assert_eq!(created["progress"]["total"], 0);

        let id = created["id"].as_str().unwrap();
        let (status, toggled) = app
            .request(Method::POST, &format!("/api/todos/{id}/toggle"), token, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(toggled["todo"]["completed_at"].is_string());
        assert_eq!(toggled["next_todo"]["due_date"], "2025-03-17T01:00:00Z");
        assert_eq!(toggled["next_todo"]["recurrence_pattern"], "weekly");
        assert!(toggled["next_todo"]["completed_at"].is_null());

        let (_, page) = app
            .request(Method::GET, "/api/todos?status=incomplete", token, None)
            .await;
        assert_eq!(page["total"], 1);
        assert_eq!(page["data"][0]["title"], "Team sync");
    }

    #[tokio::test]
    async fn test_validation_errors_are_400() {
        let app = app().await;
        let token = app.login("kim").await;
        let token = Some(token.as_str());

        let cases = [
            json!({"title": ""}),
            json!({"title": "x".repeat(501)}),
            json!({"title": "ok", "priority": "urgent"}),
            json!({"title": "ok", "recurrence_pattern": "hourly", "due_date": "2025-03-10"}),
            json!({"title": "ok", "due_date": "someday"}),
            json!({"title": "ok", "recurrence_pattern": "daily"}),
        ];
        for body in cases {
            let (status, error) = app
                .request(Method::POST, "/api/todos", token, Some(body.clone()))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert!(error["error"].is_string(), "{body}");
        }
    }

    #[tokio::test]
    async fn test_patch_semantics_over_http() {
        let app = app().await;
        let token = app.login("kim").await;
        let token = Some(token.as_str());

        let (_, created) = app
            .request(
                Method::POST,
                "/api/todos",
                token,
                Some(json!({"title": "Book flights", "priority": "high"})),
            )
            .await;
        let uri = format!("/api/todos/{}", created["id"].as_str().unwrap());

        app.clock.advance(Duration::minutes(1));
        let (status, same) = app.request(Method::PUT, &uri, token, Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(same["updated_at"], created["updated_at"]);
        assert!(same.get("next_todo").is_none());

        let (_, cleared) = app
            .request(Method::PUT, &uri, token, Some(json!({"priority": null})))
            .await;
        assert!(cleared["priority"].is_null());
        assert_eq!(cleared["title"], "Book flights");

        let (status, _) = app
            .request(Method::PUT, &uri, token, Some(json!({"reminder_minutes": 15})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_other_users_resources_are_404() {
        let app = app().await;
        let owner = app.login("liam").await;
        let intruder = app.login("mia").await;

        let (_, todo) = app
            .request(
                Method::POST,
                "/api/todos",
                Some(&owner),
                Some(json!({"title": "Mine"})),
            )
            .await;
        let id = todo["id"].as_str().unwrap();

        let (_, subtask) = app
            .request(
                Method::POST,
                &format!("/api/todos/{id}/subtasks"),
                Some(&owner),
                Some(json!({"title": "Step"})),
            )
            .await;
        let subtask_id = subtask["subtask"]["id"].as_str().unwrap();

        for (method, uri) in [
            (Method::GET, format!("/api/todos/{id}")),
            (Method::DELETE, format!("/api/todos/{id}")),
            (Method::GET, format!("/api/todos/{id}/subtasks")),
            (Method::DELETE, format!("/api/todos/{id}/subtasks/{subtask_id}")),
        ] {
            let (status, _) = app.request(method, &uri, Some(&intruder), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }

        let (status, _) = app
            .request(Method::GET, &format!("/api/todos/{id}"), Some(&owner), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_subtask_crud_and_progress() {
        let app = app().await;
        let token = app.login("nina").await;
        let token = Some(token.as_str());

        let (_, todo) = app
            .request(Method::POST, "/api/todos", token, Some(json!({"title": "Trip"})))
            .await;
        let base = format!("/api/todos/{}/subtasks", todo["id"].as_str().unwrap());

        let (status, first) = app
            .request(Method::POST, &base, token, Some(json!({"title": "Pack"})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["subtask"]["position"], 0);
        app.request(Method::POST, &base, token, Some(json!({"title": "Passport"})))
            .await;

        let first_uri = format!("{}/{}", base, first["subtask"]["id"].as_str().unwrap());
        let (status, done) = app
            .request(Method::PUT, &first_uri, token, Some(json!({"completed": true})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["subtask"]["completed"], true);

        let (_, list) = app.request(Method::GET, &base, token, None).await;
        assert_eq!(list["progress"], json!({"total": 2, "completed": 1, "percentage": 50}));

        let (status, _) = app
            .request(Method::POST, &base, token, Some(json!({"title": "x", "position": -1})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, deleted) = app.request(Method::DELETE, &first_uri, token, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["success"], true);
        assert_eq!(deleted["deleted_id"], first["subtask"]["id"]);
    }

    #[tokio::test]
    async fn test_tags_and_search() {
        let app = app().await;
        let token = app.login("omar").await;
        let token = Some(token.as_str());

        let (status, tag) = app
            .request(Method::POST, "/api/tags", token, Some(json!({"name": "Urgent"})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(tag["tag"]["color"], "#3B82F6");

        let (status, _) = app
            .request(Method::POST, "/api/tags", token, Some(json!({"name": "Urgent"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .request(
                Method::POST,
                "/api/tags",
                token,
                Some(json!({"name": "Bad", "color": "red"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, todo) = app
            .request(Method::POST, "/api/todos", token, Some(json!({"title": "Renew passport"})))
            .await;
        app.request(Method::POST, "/api/todos", token, Some(json!({"title": "Groceries"})))
            .await;

        let (status, tagged) = app
            .request(
                Method::PUT,
                &format!("/api/todos/{}/tags", todo["id"].as_str().unwrap()),
                token,
                Some(json!({"tag_ids": [tag["tag"]["id"]]})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tagged["tags"][0]["name"], "Urgent");

        let (_, by_tag_name) = app
            .request(Method::GET, "/api/todos?search=urg", token, None)
            .await;
        assert_eq!(by_tag_name["total"], 1);
        assert_eq!(by_tag_name["data"][0]["title"], "Renew passport");

        let tag_id = tag["tag"]["id"].as_str().unwrap();
        let (_, by_tag_id) = app
            .request(Method::GET, &format!("/api/todos?tag_ids={tag_id}"), token, None)
            .await;
        assert_eq!(by_tag_id["total"], 1);

        let (status, _) = app
            .request(Method::DELETE, &format!("/api/tags/{tag_id}"), token, None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, untagged) = app
            .request(
                Method::GET,
                &format!("/api/todos/{}", todo["id"].as_str().unwrap()),
                token,
                None,
            )
            .await;
        assert_eq!(untagged["tags"], json!([]));
    }

    #[tokio::test]
    async fn test_template_use_over_http() {
        let app = app().await;
        let token = app.login("pia").await;
        let token = Some(token.as_str());

        let (status, created) = app
            .request(
                Method::POST,
                "/api/templates",
                token,
                Some(json!({
                    "name": "Weekly review",
                    "category": "work",
                    "due_date_offset_days": 1,
                    "subtasks": [{"title": "Inbox"}, {"title": "Calendar"}],
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["template"]["id"].as_str().unwrap();

        let (_, listed) = app
            .request(Method::GET, "/api/templates?category=work", token, None)
            .await;
        assert_eq!(listed["templates"].as_array().unwrap().len(), 1);
        let (_, none) = app
            .request(Method::GET, "/api/templates?category=home", token, None)
            .await;
        assert_eq!(none["templates"], json!([]));

        // No body at all is allowed.
        let (status, used) = app
            .request(Method::POST, &format!("/api/templates/{id}/use"), token, None)
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(used["todo"]["due_date"], "2025-03-02T01:00:00Z");
        assert_eq!(used["todo"]["subtasks"].as_array().unwrap().len(), 2);
        assert_eq!(used["message"], "Todo created from template 'Weekly review'");

        let (status, _) = app
            .request(
                Method::POST,
                &format!("/api/templates/{id}/use"),
                token,
                Some(json!({"custom_due_date": "not a date"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    async fn poll(app: &TestApp, token: Option<&str>) -> (StatusCode, serde_json::Value) {
        app.request(Method::GET, "/api/notifications/check", token, None)
            .await
    }

    #[tokio::test]
    async fn test_notification_poll_respects_cooldown() {
        let app = app().await;
        let token = app.login("quinn").await;
        let token = Some(token.as_str());

        app.request(
            Method::POST,
            "/api/todos",
            token,
            Some(json!({
                "title": "Call bank",
                "due_date": "2025-03-01T10:00",
                "reminder_minutes": 30,
            })),
        )
        .await;

        // 09:00, lead window opens at 09:30.
        let (_, body) = poll(&app, token).await;
        assert_eq!(body["count"], 0);

        app.clock.advance(Duration::minutes(31));
        let (status, body) = poll(&app, token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["todos"][0]["title"], "Call bank");
        assert_eq!(body["todos"][0]["notify_at"], "2025-03-01T01:30:00Z");
        assert!(body["todos"][0]["due_display"]
            .as_str()
            .unwrap()
            .starts_with("Mar 1, 2025, 10:00 AM"));

        app.clock.advance(Duration::minutes(59));
        assert_eq!(poll(&app, token).await.1["count"], 0);

        app.clock.advance(Duration::minutes(1));
        assert_eq!(poll(&app, token).await.1["count"], 1);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let app = app().await;
        let (status, doc) = app
            .request(Method::GET, "/api-docs/openapi.json", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/api/todos/{id}/toggle"].is_object());
        assert!(doc["components"]["securitySchemes"]["session_cookie"].is_object());
    }
}
