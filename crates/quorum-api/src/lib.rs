pub mod error;
pub mod middleware;
pub mod routes;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use quorum_core::AppState;
use tower_http::trace::TraceLayer;

/// Build the application router over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/polls",
            get(routes::polls::list_polls).post(routes::polls::create_poll),
        )
        .route(
            "/polls/{id}",
            get(routes::polls::get_poll)
                .post(routes::polls::update_poll)
                .put(routes::polls::update_poll)
                .delete(routes::polls::delete_poll),
        )
        .route("/polls/{id}/vote", post(routes::polls::submit_vote))
        .route("/polls/{id}/results", get(routes::polls::poll_results))
        .route("/polls/{id}/edit", get(routes::pages::edit_poll))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
