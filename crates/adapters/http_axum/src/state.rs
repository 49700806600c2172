//! Shared application state for axum handlers.

use std::sync::Arc;

use mistguard_app::alerts::AlertLog;
use mistguard_app::ports::{BathroomEventRepository, Journal, ParameterRepository};
use mistguard_app::services::learning_service::LearningService;
use mistguard_app::status::StatusBoard;
use mistguard_domain::mold::MoldRiskAnalyzer;
use mistguard_domain::settings::LearnerConfig;

/// Application state shared across all axum handlers.
///
/// Generic over the storage ports to avoid dynamic dispatch. `Clone` is
/// implemented manually so the underlying types themselves do not need to be
/// `Clone` — only the `Arc` wrappers are cloned.
pub struct AppState<E, J, P> {
    /// Latest per-room status published by the bathroom monitors.
    pub status: Arc<StatusBoard>,
    /// Operator alerts raised by the decision cycle.
    pub alerts: Arc<AlertLog>,
    pub events: Arc<E>,
    pub journal: Arc<J>,
    pub params: Arc<P>,
    pub learning: Arc<LearningService<Arc<E>, Arc<P>>>,
    pub analyzer: MoldRiskAnalyzer,
}

impl<E, J, P> Clone for AppState<E, J, P> {
    fn clone(&self) -> Self {
        Self {
            status: Arc::clone(&self.status),
            alerts: Arc::clone(&self.alerts),
            events: Arc::clone(&self.events),
            journal: Arc::clone(&self.journal),
            params: Arc::clone(&self.params),
            learning: Arc::clone(&self.learning),
            analyzer: self.analyzer,
        }
    }
}

impl<E, J, P> AppState<E, J, P>
where
    E: BathroomEventRepository + Send + Sync + 'static,
    J: Journal + Send + Sync + 'static,
    P: ParameterRepository + Send + Sync + 'static,
{
    /// Create the state from the shared repositories and runtime views.
    ///
    /// The repositories are the same instances the background loops use, so
    /// the API always reads what the monitors wrote.
    pub fn new(
        status: Arc<StatusBoard>,
        alerts: Arc<AlertLog>,
        events: Arc<E>,
        journal: Arc<J>,
        params: Arc<P>,
        learner: LearnerConfig,
    ) -> Self {
        let learning = LearningService::new(
            Arc::clone(&events),
            Arc::clone(&params),
            learner,
            Arc::clone(&alerts),
        );
        Self {
            status,
            alerts,
            events,
            journal,
            params,
            learning: Arc::new(learning),
            analyzer: MoldRiskAnalyzer::default(),
        }
    }
}
