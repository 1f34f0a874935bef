use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uplink_api::config::ServerConfig;
use uplink_api::groundstation::GroundStationGateway;
use uplink_api::router::build_app_router;
use uplink_api::state::AppState;
use uplink_events::{EventBus, EventPersistence};
use uplink_pipeline::artifacts::{FsArtifactStore, MemoryArtifactStore};
use uplink_pipeline::collaborators::{ArtifactStore, Compiler};
use uplink_pipeline::compiler::{HttpCompiler, PassthroughCompiler};
use uplink_pipeline::{
    DecisionHandler, DispatchQueue, DispatchWorker, PendingRegistry, SubmissionHandler,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "uplink_api=debug,uplink_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let persistence_handle = config.pipeline.audit_log_path.as_ref().map(|path| {
        tracing::info!(path = %path, "Audit events will be appended to file");
        tokio::spawn(EventPersistence::run(
            PathBuf::from(path),
            event_bus.subscribe(),
        ))
    });

    // --- Artifact store ---
    let artifacts: Arc<dyn ArtifactStore> = match &config.pipeline.artifact_dir {
        Some(dir) => {
            let store = FsArtifactStore::open(dir)
                .await
                .expect("Failed to open artifact directory");
            tracing::info!(dir = %dir, "Using filesystem artifact store");
            Arc::new(store)
        }
        None => {
            tracing::info!("Using in-memory artifact store");
            Arc::new(MemoryArtifactStore::new())
        }
    };

    // --- Compiler ---
    let compiler: Arc<dyn Compiler> = match &config.pipeline.compiler_url {
        Some(url) => {
            let compiler = HttpCompiler::new(
                url.clone(),
                Duration::from_secs(config.pipeline.compiler_timeout_secs),
            )
            .expect("Failed to build compiler client");
            tracing::info!(url = %url, "Using external flight plan compiler");
            Arc::new(compiler)
        }
        None => {
            tracing::info!("Using passthrough flight plan compiler");
            Arc::new(PassthroughCompiler::new(Arc::clone(&artifacts)))
        }
    };

    // --- Ground-station gateway ---
    let gateway = Arc::new(GroundStationGateway::new(Duration::from_secs(
        config.pipeline.gs_response_timeout_secs,
    )));

    // --- Pipeline ---
    let registry = Arc::new(PendingRegistry::new());
    let (queue, jobs) = DispatchQueue::new();

    let worker_cancel = CancellationToken::new();
    let worker = DispatchWorker::new(
        Arc::clone(&registry),
        gateway.clone(),
        gateway.clone(),
        Arc::clone(&event_bus),
    )
    .with_concurrency(config.pipeline.dispatch_concurrency);
    let worker_handle = tokio::spawn(worker.run(jobs, worker_cancel.clone()));

    let submissions =
        SubmissionHandler::new(Arc::clone(&registry), artifacts, Arc::clone(&event_bus));
    let decisions = DecisionHandler::new(registry, compiler, queue, Arc::clone(&event_bus));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        submissions,
        decisions,
        gateway: Arc::clone(&gateway),
        event_bus: Arc::clone(&event_bus),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Running dispatches finish; queued ones are dropped.
    worker_cancel.cancel();
    if tokio::time::timeout(shutdown_timeout, worker_handle)
        .await
        .is_err()
    {
        tracing::warn!("Dispatch worker did not stop within the shutdown timeout");
    }
    tracing::info!("Dispatch worker stopped");

    // Dropping the last bus handle closes the channel and stops persistence.
    drop(event_bus);
    if let Some(handle) = persistence_handle {
        let _ = tokio::time::timeout(shutdown_timeout, handle).await;
        tracing::info!("Audit persistence stopped");
    }

    let gs_count = gateway.connected_count().await;
    tracing::info!(gs_count, "Closing remaining ground station connections");
    gateway.shutdown_all().await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
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
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
