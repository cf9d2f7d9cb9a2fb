//! Bullhorn server entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use apalis::prelude::*;
use axum::{middleware, Router};
use bullhorn_api::{middleware::AppState, router as api_router};
use bullhorn_common::{Config, LocalStorage};
use bullhorn_core::{
    BroadcastService, EventService, GroupService, MediaService, NoOpDispatch, NotificationDispatch,
};
use bullhorn_db::repositories::{
    BroadcastRepository, EventRepository, GroupRepository, MediaRepository, UserRepository,
};
use bullhorn_queue::workers::{notify_worker, NotifyContext};
use bullhorn_queue::{Mailer, NotifyJob, RedisDispatchService};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bullhorn=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting bullhorn server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = bullhorn_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    bullhorn_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let group_repo = GroupRepository::new(Arc::clone(&db));
    let media_repo = MediaRepository::new(Arc::clone(&db));
    let broadcast_repo = BroadcastRepository::new(Arc::clone(&db));
    let event_repo = EventRepository::new(Arc::clone(&db));

    // Connect to Redis and initialize the notification queue when
    // email is enabled; fall back to a no-op dispatch otherwise.
    let mut notify_storage = None;
    let dispatch: Arc<dyn NotificationDispatch> = if config.email.enabled {
        info!("Connecting to Redis...");
        let redis_client = redis::Client::open(config.redis.url.as_str())?;
        let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;
        let storage = apalis_redis::RedisStorage::<NotifyJob>::new(redis_conn);
        info!("Connected to Redis job queue");

        notify_storage = Some(storage.clone());
        Arc::new(RedisDispatchService::new(storage))
    } else {
        info!("Email dispatch disabled, using no-op dispatch");
        Arc::new(NoOpDispatch)
    };

    // Initialize file storage
    let storage = Arc::new(LocalStorage::new(
        PathBuf::from(&config.storage.base_path),
        config.storage.base_url.clone(),
    ));

    // Initialize services
    let broadcast_service = BroadcastService::new(
        broadcast_repo.clone(),
        group_repo.clone(),
        user_repo.clone(),
        dispatch.clone(),
    );
    let event_service = EventService::new(
        event_repo.clone(),
        group_repo.clone(),
        user_repo.clone(),
        dispatch,
    );
    let group_service = GroupService::new(group_repo.clone());
    let media_service = MediaService::new(media_repo, storage);

    // Create app state
    let state = AppState {
        broadcast_service,
        event_service,
        group_service,
        media_service,
        user_repo: user_repo.clone(),
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            bullhorn_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start notification worker if email is enabled
    if let Some(storage) = notify_storage {
        info!("Starting notification worker...");
        let notify_ctx = NotifyContext {
            broadcast_repo,
            event_repo,
            group_repo,
            user_repo,
            mailer: Mailer::new(&config.email)?,
        };

        // Spawn the worker in the background
        tokio::spawn(async move {
            let monitor = Monitor::new().register({
                WorkerBuilder::new("notify")
                    .data(notify_ctx)
                    .backend(storage)
                    .build_fn(notify_worker)
            });

            if let Err(e) = monitor.run().await {
                tracing::error!(error = %e, "Notification worker failed");
            }
        });
        info!("Notification worker started");
    }

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
