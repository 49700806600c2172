//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use mistguard_app::ports::{BathroomEventRepository, Journal, ParameterRepository};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the API routes under `/api` next to `/health`. Includes a
/// [`TraceLayer`] that logs each HTTP request/response at the `DEBUG` level.
pub fn build<E, J, P>(state: AppState<E, J, P>) -> Router
where
    E: BathroomEventRepository + Send + Sync + 'static,
    J: Journal + Send + Sync + 'static,
    P: ParameterRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
