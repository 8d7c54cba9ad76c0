pub mod auth;
pub mod health;
pub mod threads;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the API router.
///
/// Routes are split into **public** (no auth required) and **protected**
/// (gated behind the bearer-token middleware).
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/v1/health", get(health::health));

    let protected = Router::new()
        .route("/v1/threads", post(threads::create_thread).get(threads::list_threads))
        .route("/v1/threads/:id", get(threads::get_thread))
        .route("/v1/threads/:id/turns", post(threads::post_turn))
        .route_layer(middleware::from_fn_with_state(state, auth::require_api_token));

    public.merge(protected)
}
