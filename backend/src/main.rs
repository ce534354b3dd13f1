//! Field Health Intelligence - Backend Server
//!
//! Monitors field vegetation health from satellite index statistics and
//! delivers crop-aware alerts to farmers, degrading to cached or
//! geometry-only results when connectivity is lost.

use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use field_health_backend::{
    create_app,
    external::{LineMessagingClient, SmsGatewayClient, StatisticsClient, StatisticsProvider},
    services::{
        connectivity, AlertDispatcher, ConnectivityMonitor, FieldMonitor, MonitorDeps,
        MonitorSettings, OfflineCache, PgPersistence,
    },
    AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "fhi_server=debug,field_health_backend=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Field Health Intelligence Server");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.environment == "development" {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    let persistence = Arc::new(PgPersistence::new(db_pool.clone()));
    let cache = Arc::new(OfflineCache::with_ttl_hours(config.cache.ttl_hours)?);
    let connectivity_monitor = Arc::new(ConnectivityMonitor::new(true));

    let provider: Arc<dyn StatisticsProvider> = Arc::new(StatisticsClient::new(
        config.statistics.api_endpoint.clone(),
        config.statistics.api_key.clone(),
        config.statistics.timeout(),
    )?);

    // Notification channels
    let notifications = &config.notifications;
    let mut dispatcher =
        AlertDispatcher::new(notifications.channel_timeout()).with_in_app_store(persistence.clone());
    if let Some(token) = &notifications.line_channel_access_token {
        dispatcher = dispatcher.with_channel(Arc::new(LineMessagingClient::new(
            token.clone(),
            notifications.channel_timeout(),
        )?));
    }
    if let (Some(endpoint), Some(api_key)) = (&notifications.sms_endpoint, &notifications.sms_api_key) {
        dispatcher = dispatcher.with_channel(Arc::new(SmsGatewayClient::new(
            endpoint.clone(),
            api_key.clone(),
            notifications.sms_sender_id.clone(),
            notifications.channel_timeout(),
        )?));
    }
    tracing::info!(channels = ?dispatcher.channel_names(), "Alert dispatcher ready");

    let monitor = Arc::new(FieldMonitor::new(
        MonitorDeps {
            provider: provider.clone(),
            cache: cache.clone(),
            dispatcher: Arc::new(dispatcher),
            persistence,
            connectivity: connectivity_monitor.clone(),
        },
        MonitorSettings::from_config(&config),
    ));

    // Background tasks
    connectivity::spawn_probe(
        connectivity_monitor,
        provider,
        Duration::from_secs(config.statistics.probe_interval_secs),
    );
    spawn_cache_sweeper(cache, Duration::from_secs(config.cache.sweep_interval_secs));

    // Create application state
    let state = AppState {
        db: db_pool,
        monitor,
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically evict expired offline cache entries
fn spawn_cache_sweeper(cache: Arc<OfflineCache>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately; nothing has expired yet
        ticker.tick().await;
        loop {
            ticker.tick().await;
            cache.sweep_expired().await;
        }
    });
}
