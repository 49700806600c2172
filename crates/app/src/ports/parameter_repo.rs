//! Parameter repository port — learned thresholds per room.

use std::future::Future;
use std::sync::Arc;

use mistguard_domain::error::MistguardError;
use mistguard_domain::id::RoomId;
use mistguard_domain::learning::LearnedParameters;

/// Storage for the thresholds the learner produced.
pub trait ParameterRepository {
    /// Learned parameters of a room; `None` means the configured defaults apply.
    fn get_learned_parameters(
        &self,
        room_id: &RoomId,
    ) -> impl Future<Output = Result<Option<LearnedParameters>, MistguardError>> + Send;

    /// Replace the parameters of a room in one step.
    fn save_learned_parameters(
        &self,
        params: LearnedParameters,
    ) -> impl Future<Output = Result<(), MistguardError>> + Send;
}

impl<T: ParameterRepository + Send + Sync> ParameterRepository for Arc<T> {
    fn get_learned_parameters(
        &self,
        room_id: &RoomId,
    ) -> impl Future<Output = Result<Option<LearnedParameters>, MistguardError>> + Send {
        (**self).get_learned_parameters(room_id)
    }

    fn save_learned_parameters(
        &self,
        params: LearnedParameters,
    ) -> impl Future<Output = Result<(), MistguardError>> + Send {
        (**self).save_learned_parameters(params)
    }
}
