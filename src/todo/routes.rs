use axum::{
    routing::{get, post, put},
    Router,
};

use super::todo_handlers::{
    create_todo, delete_todo, get_todo, list_todos, priority_counts, save_as_template,
    set_todo_tags, toggle_todo, update_todo,
};
use crate::{
    state::AppState,
    subtask::subtask_handlers::{create_subtask, delete_subtask, list_subtasks, update_subtask},
};

pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/priority-counts", get(priority_counts))
        .route("/:id", get(get_todo).put(update_todo).delete(delete_todo))
        .route("/:id/toggle", post(toggle_todo))
        .route("/:id/tags", put(set_todo_tags))
        .route("/:id/save-as-template", post(save_as_template))
        .route("/:id/subtasks", get(list_subtasks).post(create_subtask))
        .route(
            "/:id/subtasks/:subtask_id",
            put(update_subtask).delete(delete_subtask),
        )
}
