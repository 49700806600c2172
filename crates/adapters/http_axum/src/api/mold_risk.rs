//! Stateless mold-risk calculator.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use mistguard_app::ports::{BathroomEventRepository, Journal, ParameterRepository};
use mistguard_domain::mold::MoldRiskAssessment;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MoldRiskQuery {
    /// °C.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
}

/// `GET /api/mold-risk?temperature=&humidity=`
pub async fn assess<E, J, P>(
    State(state): State<AppState<E, J, P>>,
    Query(query): Query<MoldRiskQuery>,
) -> Result<Json<MoldRiskAssessment>, ApiError>
where
    E: BathroomEventRepository + Send + Sync + 'static,
    J: Journal + Send + Sync + 'static,
    P: ParameterRepository + Send + Sync + 'static,
{
    let assessment = state.analyzer.assess(query.temperature, query.humidity)?;
    Ok(Json(assessment))
}
