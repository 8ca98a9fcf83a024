use axum::{
    routing::{get, put},
    Router,
};

use super::tag_handlers::{create_tag, delete_tag, list_tags, update_tag};
use crate::state::AppState;

pub fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags).post(create_tag))
        .route("/:id", put(update_tag).delete(delete_tag))
}
