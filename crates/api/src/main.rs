use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use herald_db::{DbPool, MemoryNotificationStore, NotificationStore, PgNotificationStore};
use herald_events::{ExpirySweeper, NotificationHub, NotificationService};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use herald_api::config::{ServerConfig, StoreBackend};
use herald_api::router::build_app_router;
use herald_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        store = ?config.store_backend,
        queue_capacity = config.queue_capacity,
        "Loaded server configuration"
    );

    let (store, pool): (Arc<dyn NotificationStore>, Option<DbPool>) = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL must be set");

            let pool = herald_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            herald_db::health_check(&pool)
                .await
                .expect("Database health check failed");

            herald_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            let store: Arc<dyn NotificationStore> =
                Arc::new(PgNotificationStore::new(pool.clone()));
            (store, Some(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory notification store; data is lost on restart");
            let store: Arc<dyn NotificationStore> = Arc::new(MemoryNotificationStore::new());
            (store, None)
        }
    };

    let hub = Arc::new(NotificationHub::with_capacity(config.queue_capacity));
    let notifications = Arc::new(NotificationService::new(store, hub));

    let sweep_cancel = CancellationToken::new();
    let sweeper = ExpirySweeper::new(
        Arc::clone(&notifications),
        Duration::from_secs(config.sweep_interval_secs),
    );
    let sweep_handle = tokio::spawn({
        let cancel = sweep_cancel.clone();
        async move { sweeper.run(cancel).await }
    });
    tracing::info!(
        interval_secs = config.sweep_interval_secs,
        "Expiry sweeper started"
    );

    let state = AppState {
        config: Arc::new(config.clone()),
        notifications,
        pool,
    };
    let app = build_app_router(state, &config);

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

    tracing::info!("Server stopped accepting connections, cleaning up");

    sweep_cancel.cancel();
    let _ = tokio::time::timeout(
        Duration::from_secs(config.shutdown_timeout_secs),
        sweep_handle,
    )
    .await;
    tracing::info!("Expiry sweeper stopped");
}

/// Install the global subscriber. `LOG_FORMAT=json` switches to
/// line-delimited JSON output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "herald_api=debug,herald_events=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
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
