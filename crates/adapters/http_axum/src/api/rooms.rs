//! JSON REST handlers for rooms: status, events, parameters and learning.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use mistguard_app::ports::{BathroomEventRepository, Journal, ParameterRepository};
use mistguard_app::status::RoomStatus;
use mistguard_domain::error::NotFoundError;
use mistguard_domain::event::BathroomEvent;
use mistguard_domain::id::RoomId;
use mistguard_domain::learning::{ControlThresholds, LearnedParameters, LearningOutcome};
use mistguard_domain::time::now;

use super::LimitQuery;
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_EVENT_LIMIT: usize = 50;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<RoomStatus>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<RoomStatus>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Thresholds a room is currently controlled with, next to what was learned.
#[derive(Debug, Serialize)]
pub struct ParametersView {
    pub room_id: RoomId,
    pub active: ControlThresholds,
    pub learned: Option<LearnedParameters>,
}

/// Resolve a path segment to a configured room.
fn known_room<E, J, P>(state: &AppState<E, J, P>, room_id: &str) -> Result<RoomStatus, ApiError> {
    let room_id: RoomId = room_id.parse()?;
    state.status.get(&room_id).ok_or_else(|| {
        ApiError::from(NotFoundError {
            entity: "Room",
            id: room_id.to_string(),
        })
    })
}

/// `GET /api/rooms`
pub async fn list<E, J, P>(State(state): State<AppState<E, J, P>>) -> ListResponse
where
    E: BathroomEventRepository + Send + Sync + 'static,
    J: Journal + Send + Sync + 'static,
    P: ParameterRepository + Send + Sync + 'static,
{
    ListResponse::Ok(Json(state.status.list()))
}

/// `GET /api/rooms/{room_id}`
pub async fn get<E, J, P>(
    State(state): State<AppState<E, J, P>>,
    Path(room_id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    E: BathroomEventRepository + Send + Sync + 'static,
    J: Journal + Send + Sync + 'static,
    P: ParameterRepository + Send + Sync + 'static,
{
    let status = known_room(&state, &room_id)?;
    Ok(GetResponse::Ok(Json(status)))
}

/// `GET /api/rooms/{room_id}/events` — newest first.
pub async fn events<E, J, P>(
    State(state): State<AppState<E, J, P>>,
    Path(room_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<BathroomEvent>>, ApiError>
where
    E: BathroomEventRepository + Send + Sync + 'static,
    J: Journal + Send + Sync + 'static,
    P: ParameterRepository + Send + Sync + 'static,
{
    let status = known_room(&state, &room_id)?;
    let events = state
        .events
        .recent_events(&status.room_id, query.resolve(DEFAULT_EVENT_LIMIT))
        .await?;
    Ok(Json(events))
}

/// `GET /api/rooms/{room_id}/parameters`
pub async fn parameters<E, J, P>(
    State(state): State<AppState<E, J, P>>,
    Path(room_id): Path<String>,
) -> Result<Json<ParametersView>, ApiError>
where
    E: BathroomEventRepository + Send + Sync + 'static,
    J: Journal + Send + Sync + 'static,
    P: ParameterRepository + Send + Sync + 'static,
{
    let status = known_room(&state, &room_id)?;
    let learned = state.params.get_learned_parameters(&status.room_id).await?;
    Ok(Json(ParametersView {
        room_id: status.room_id,
        active: status.thresholds,
        learned,
    }))
}

/// `POST /api/rooms/{room_id}/learn` — run the learner now.
///
/// Accepted parameters are picked up by the room's monitor on its next tick.
pub async fn learn<E, J, P>(
    State(state): State<AppState<E, J, P>>,
    Path(room_id): Path<String>,
) -> Result<Json<LearningOutcome>, ApiError>
where
    E: BathroomEventRepository + Send + Sync + 'static,
    J: Journal + Send + Sync + 'static,
    P: ParameterRepository + Send + Sync + 'static,
{
    let status = known_room(&state, &room_id)?;
    let outcome = state.learning.learn_room(&status.room_id, now()).await?;
    Ok(Json(outcome))
}
