use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/counter/increment", post(handlers::increment))
        .route("/counter/decrement", post(handlers::decrement))
        .route("/counter/reset", post(handlers::reset))
        .route("/api/today", get(handlers::get_today))
        .route("/api/history", get(handlers::get_history))
        .route("/api/action", post(handlers::action))
        .with_state(state)
}
