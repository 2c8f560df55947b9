//! AuditHub Server — influencer audit pipeline backend.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use audithub_core::config::AppConfig;
use audithub_core::error::AppError;
use audithub_database::store::{AuditStore, JobStore, UsageStore};
use audithub_entity::audit::Platform;
use audithub_entity::job::JobPayload;
use audithub_service::notification::{LogNotifier, Notifier};
use audithub_worker::events::JobOutcome;

#[tokio::main]
async fn main() {
    let env = std::env::var("AUDITHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function.
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting AuditHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Database connection + migrations ─────────────────────────
    tracing::info!("Connecting to database...");
    let db_pool = audithub_database::connection::create_pool(&config.database).await?;
    audithub_database::migration::run_migrations(&db_pool).await?;

    // ── Stores ───────────────────────────────────────────────────
    let audit_store: Arc<dyn AuditStore> = Arc::new(
        audithub_database::repositories::AuditRepository::new(db_pool.clone()),
    );
    let usage_store: Arc<dyn UsageStore> = Arc::new(
        audithub_database::repositories::UsageRepository::new(db_pool.clone()),
    );
    let job_store: Arc<dyn JobStore> = Arc::new(
        audithub_database::repositories::JobRepository::new(db_pool.clone()),
    );

    // ── Profile collectors ───────────────────────────────────────
    let mut collectors = audithub_collector::CollectorRegistry::new(Duration::from_secs(
        config.collector.timeout_seconds,
    ));
    match config.collector.provider.as_str() {
        "fixture" => {
            let fixture = Arc::new(audithub_collector::FixtureCollector::from_file(
                &config.collector.fixture_path,
            )?);
            collectors.register(Platform::Instagram, fixture);
        }
        "none" => {
            tracing::warn!(
                "No profile collectors registered; all audits will fail as unsupported"
            );
        }
        other => {
            return Err(AppError::configuration(format!(
                "Unknown collector provider: {other}"
            )));
        }
    }
    let collectors = Arc::new(collectors);

    // ── Job queue ────────────────────────────────────────────────
    let worker_id = format!("worker-{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let retry = audithub_worker::queue::RetryPolicy {
        max_attempts: config.worker.max_attempts,
        backoff_base: Duration::from_secs(config.worker.backoff_base_seconds),
    };
    let job_queue = Arc::new(audithub_worker::queue::JobQueue::new(
        Arc::clone(&job_store),
        worker_id.clone(),
        retry,
    ));

    // ── Orchestrator ─────────────────────────────────────────────
    let orchestrator = Arc::new(audithub_service::audit::AuditOrchestrator::new(
        Arc::clone(&audit_store),
        Arc::clone(&usage_store),
        Arc::clone(&job_store),
        config.worker.max_attempts,
    ));

    // ── Shutdown channel ─────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Notifier bridge ──────────────────────────────────────────
    if config.notifier.enabled {
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
        spawn_notifier_bridge(
            job_queue.subscribe(),
            Arc::clone(&audit_store),
            notifier,
            shutdown_rx.clone(),
        );
    }

    // ── Background worker + scheduler ────────────────────────────
    let worker_handle = if config.worker.enabled {
        tracing::info!("Starting background worker...");

        let mut job_executor = audithub_worker::executor::JobExecutor::new();
        job_executor.register(Arc::new(audithub_worker::jobs::AuditJobHandler::new(
            Arc::clone(&audit_store),
            Arc::clone(&collectors),
        )));
        job_executor.register(Arc::new(audithub_worker::jobs::QueueCleanupHandler::new(
            Arc::clone(&job_queue),
        )));
        job_executor.register(Arc::new(audithub_worker::jobs::UsageResetHandler::new(
            Arc::clone(&usage_store),
        )));
        let job_executor = Arc::new(job_executor);

        let worker_runner = audithub_worker::runner::WorkerRunner::new(
            Arc::clone(&job_queue),
            Arc::clone(&job_executor),
            config.worker.clone(),
            worker_id,
        );

        let scheduler = audithub_worker::scheduler::CronScheduler::new(
            Arc::clone(&job_queue),
            config.worker.clone(),
        )
        .await?;
        scheduler.register_default_tasks().await?;
        scheduler.start().await?;

        let worker_cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            worker_runner.run(worker_cancel).await;
        });

        tracing::info!("Background worker started");
        // The scheduler must stay alive for its cron tasks to keep firing.
        Some((handle, scheduler))
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // ── HTTP server ──────────────────────────────────────────────
    let app_state = audithub_api::state::AppState {
        config: Arc::new(config.clone()),
        token_verifier: Arc::new(audithub_api::extractors::auth::TokenVerifier::new(
            &config.auth,
        )),
        orchestrator: Arc::clone(&orchestrator),
        job_queue: Arc::clone(&job_queue),
    };

    let app = audithub_api::router::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("AuditHub server listening on {}", addr);

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Wait for background tasks ────────────────────────────────
    tracing::info!("Waiting for background tasks to complete...");
    if let Some((handle, mut scheduler)) = worker_handle {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!("Scheduler shutdown error: {}", e);
        }
        let _ = tokio::time::timeout(Duration::from_secs(30), handle).await;
    }

    tracing::info!("AuditHub server shut down gracefully");
    Ok(())
}

/// Forward completed-audit events to the notifier, best-effort.
fn spawn_notifier_bridge(
    mut events: tokio::sync::broadcast::Receiver<audithub_worker::events::JobEvent>,
    audits: Arc<dyn AuditStore>,
    notifier: Arc<dyn Notifier>,
    mut cancel: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        break;
                    }
                }
                event = events.recv() => {
                    let event = match event {
                        Ok(event) => event,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!("Notifier bridge lagged, skipped {} event(s)", skipped);
                            continue;
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    };

                    if event.outcome != JobOutcome::Completed {
                        continue;
                    }
                    let Ok(JobPayload::AuditProcess { audit_id, owner_id, .. }) =
                        serde_json::from_value(event.payload)
                    else {
                        continue;
                    };

                    match audits.find_by_id(audit_id).await {
                        Ok(Some(record)) => {
                            if let Err(e) = notifier.report_ready(owner_id, &record).await {
                                tracing::warn!(
                                    "Failed to send report-ready notification for audit {}: {}",
                                    audit_id,
                                    e
                                );
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::warn!(
                                "Notifier bridge could not load audit {}: {}",
                                audit_id,
                                e
                            );
                        }
                    }
                }
            }
        }
        tracing::debug!("Notifier bridge stopped");
    });
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
