//! JSON REST handler for the decision audit log.

use axum::Json;
use axum::extract::{Query, State};

use mistguard_app::ports::{BathroomEventRepository, Journal, ParameterRepository};
use mistguard_domain::decision::DecisionRecord;

use super::LimitQuery;
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_DECISION_LIMIT: usize = 100;

/// `GET /api/decisions` — most recent decision records, newest first.
pub async fn list<E, J, P>(
    State(state): State<AppState<E, J, P>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<DecisionRecord>>, ApiError>
where
    E: BathroomEventRepository + Send + Sync + 'static,
    J: Journal + Send + Sync + 'static,
    P: ParameterRepository + Send + Sync + 'static,
{
    let records = state
        .journal
        .recent_decisions(query.resolve(DEFAULT_DECISION_LIMIT))
        .await?;
    Ok(Json(records))
}
