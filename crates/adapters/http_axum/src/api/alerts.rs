//! JSON REST handler for operator alerts.

use axum::Json;
use axum::extract::{Query, State};

use mistguard_app::alerts::Alert;
use mistguard_app::ports::{BathroomEventRepository, Journal, ParameterRepository};

use super::LimitQuery;
use crate::state::AppState;

const DEFAULT_ALERT_LIMIT: usize = 50;

/// `GET /api/alerts` — newest first.
pub async fn list<E, J, P>(
    State(state): State<AppState<E, J, P>>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<Alert>>
where
    E: BathroomEventRepository + Send + Sync + 'static,
    J: Journal + Send + Sync + 'static,
    P: ParameterRepository + Send + Sync + 'static,
{
    Json(state.alerts.recent(query.resolve(DEFAULT_ALERT_LIMIT)))
}
