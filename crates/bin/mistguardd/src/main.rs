//! # mistguardd — mistguard daemon
//!
//! Composition root that wires all adapters together and runs the bathroom
//! automation.
//!
//! ## Responsibilities
//! - Load and validate configuration (config file, env vars)
//! - Initialise logging
//! - Initialise the `SQLite` connection pool and run migrations
//! - Construct the configured platform (virtual or MQTT)
//! - Resume every room's monitor and start its decision loop
//! - Start the periodic threshold learner
//! - Build the axum router and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod platform;

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use mistguard_adapter_http_axum::state::AppState;
use mistguard_adapter_storage_sqlite_sqlx::{
    SqliteBathroomEventRepository, SqliteJournal, SqliteParameterRepository,
};
use mistguard_app::alerts::AlertLog;
use mistguard_app::ports::Platform;
use mistguard_app::services::bathroom_monitor::{BathroomMonitor, MonitorContext};
use mistguard_app::services::decision_cycle::DecisionCycle;
use mistguard_app::services::learning_service::LearningService;
use mistguard_app::services::supervisor::Supervisor;
use mistguard_app::status::StatusBoard;

use crate::config::Config;
use crate::platform::AnyPlatform;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Database
    let db = mistguard_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Repositories
    let events = Arc::new(SqliteBathroomEventRepository::new(pool.clone()));
    let journal = Arc::new(SqliteJournal::new(pool.clone()));
    let params = Arc::new(SqliteParameterRepository::new(pool));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = Vec::new();

    // Platform
    let (platform, platform_task) = AnyPlatform::from_config(&config, shutdown_rx.clone());
    tasks.extend(platform_task);
    match platform.test_connectivity().await {
        Ok(()) => tracing::info!(platform = platform.name(), "platform reachable"),
        Err(err) => tracing::warn!(
            platform = platform.name(),
            error = %err,
            "platform not reachable yet, ticks will be skipped until it is"
        ),
    }

    // Services
    let alerts = Arc::new(AlertLog::default());
    let status = Arc::new(StatusBoard::default());
    let cycle = Arc::new(DecisionCycle::new(
        platform,
        Arc::clone(&journal),
        config.automation.decision_policy(),
        Arc::clone(&alerts),
    ));
    let mut supervisor = Supervisor::new(cycle);
    for room in &config.rooms {
        let ctx = MonitorContext {
            events: Arc::clone(&events),
            journal: Arc::clone(&journal),
            params: Arc::clone(&params),
            alerts: Arc::clone(&alerts),
            status: Arc::clone(&status),
        };
        let monitor = BathroomMonitor::load(room.setup(), &config.automation, ctx).await?;
        supervisor.add_room(room.id.clone(), monitor);
    }
    let supervisor = Arc::new(supervisor);
    for room in &config.rooms {
        tasks.push(supervisor.spawn_room(room.id.clone(), room.interval(), shutdown_rx.clone()));
    }

    let learning = Arc::new(LearningService::new(
        Arc::clone(&events),
        Arc::clone(&params),
        config.automation.learner(),
        Arc::clone(&alerts),
    ));
    tasks.push(learning.spawn_periodic(
        config.room_ids(),
        config.learning.interval(),
        shutdown_rx,
    ));

    // HTTP
    let state = AppState::new(
        status,
        alerts,
        events,
        journal,
        params,
        config.automation.learner(),
    );
    let app = mistguard_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        addr = %bind_addr,
        mode = %config.automation.operating_mode,
        rooms = config.rooms.len(),
        "mistguardd listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    for task in tasks {
        if let Err(err) = task.await {
            tracing::error!(error = %err, "background task failed");
        }
    }
    db.close().await;
    tracing::info!("mistguardd stopped");

    Ok(())
}

/// Wait for SIGINT or SIGTERM, then tell every background loop to stop.
async fn shutdown_signal(shutdown: watch::Sender<bool>) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown requested");
    // Receivers may already be gone if every loop ended on its own.
    let _ = shutdown.send(true);
}
