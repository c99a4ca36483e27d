use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use foy_api::{app, AppState, AuthConfig};
use foy_core::payment::PollPolicy;
use foy_core::{AdGateway, ModeSwitch};
use foy_store::app_config::Config;
use foy_store::{DbClient, DemoAdRepository, EventProducer, PostgresAdRepository, PostgresPaymentRepository, RedisClient};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foy_api=debug,foy_core=debug,foy_store=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Foy Lekke ads API on port {}", config.server.port);

    // Postgres
    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    // Redis Connection
    let redis = Arc::new(
        RedisClient::new(&config.redis.url)
            .await
            .context("Failed to connect to Redis")?,
    );

    // Kafka Connection
    let producer = Arc::new(
        EventProducer::new(&config.kafka.brokers, &config.kafka.tracking_topic)
            .context("Failed to create Kafka producer")?,
    );
    tracing::info!("Publishing live tracking events to {}", producer.tracking_topic());

    let mode = ModeSwitch::new(redis.clone()).with_default(config.ads.default_demo_mode);
    match mode.initialize().await {
        Ok(demo) => tracing::info!("Serving {} inventory", if demo { "demo" } else { "live" }),
        Err(e) => tracing::warn!("Mode flag not initialized, demo inventory until Redis is back: {}", e),
    }

    let demo_repo = Arc::new(DemoAdRepository::new().with_latency(config.ads.demo_latency()));
    let live_repo = Arc::new(PostgresAdRepository::new(db.pool.clone()));
    let gateway = AdGateway::new(demo_repo, live_repo, mode).with_live_sink(producer);

    let payments = Arc::new(PostgresPaymentRepository::new(db.pool.clone()));
    let auth = AuthConfig {
        secret: config.auth.jwt_secret.clone(),
        expiration: config.auth.jwt_expiration_seconds,
    };

    let app_state = AppState::new(gateway, payments, auth)
        .context("Failed to register metrics")?
        .with_rate_limiter(redis, config.ads.rate_limit_per_minute)
        .with_payment_policy(PollPolicy {
            interval: Duration::from_secs(config.payments.poll_interval_seconds),
            max_attempts: config.payments.max_attempts,
        });

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
