//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod alerts;
#[allow(clippy::missing_errors_doc)]
pub mod decisions;
#[allow(clippy::missing_errors_doc)]
pub mod mold_risk;
#[allow(clippy::missing_errors_doc)]
pub mod rooms;

use axum::Router;
use axum::routing::{get, post};
use serde::Deserialize;

use mistguard_app::ports::{BathroomEventRepository, Journal, ParameterRepository};

use crate::state::AppState;

/// Largest page any list endpoint returns.
const MAX_LIMIT: usize = 500;

/// `?limit=` query parameter of the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    /// Requested limit, or `default`, capped at [`MAX_LIMIT`].
    #[must_use]
    pub fn resolve(&self, default: usize) -> usize {
        self.limit.unwrap_or(default).min(MAX_LIMIT)
    }
}

/// Build the `/api` sub-router.
pub fn routes<E, J, P>() -> Router<AppState<E, J, P>>
where
    E: BathroomEventRepository + Send + Sync + 'static,
    J: Journal + Send + Sync + 'static,
    P: ParameterRepository + Send + Sync + 'static,
{
    Router::new()
        // Rooms
        .route("/rooms", get(rooms::list::<E, J, P>))
        .route("/rooms/{room_id}", get(rooms::get::<E, J, P>))
        .route("/rooms/{room_id}/events", get(rooms::events::<E, J, P>))
        .route(
            "/rooms/{room_id}/parameters",
            get(rooms::parameters::<E, J, P>),
        )
        .route("/rooms/{room_id}/learn", post(rooms::learn::<E, J, P>))
        // Audit
        .route("/decisions", get(decisions::list::<E, J, P>))
        .route("/alerts", get(alerts::list::<E, J, P>))
        // Calculator
        .route("/mold-risk", get(mold_risk::assess::<E, J, P>))
}
