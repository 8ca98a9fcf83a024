use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{middleware::auth_middleware, state::AppState};
use super::auth_handlers;

pub fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/session", get(auth_handlers::session))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/login", post(auth_handlers::login))
        .route("/logout", post(auth_handlers::logout))
        .merge(protected)
}
