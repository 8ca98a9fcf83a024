use axum::{
    routing::{get, post},
    Router,
};

use super::template_handlers::{
    create_template, delete_template, get_template, list_templates, update_template, use_template,
};
use crate::state::AppState;

pub fn template_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_templates).post(create_template))
        .route(
            "/:id",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route("/:id/use", post(use_template))
}
