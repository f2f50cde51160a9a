use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod domain;
mod gateway;
mod messaging;
mod metrics;
mod service;
mod utils;

use config::Config;
use domain::cancels::CancelsCaller;
use gateway::MySqlReadGateway;
use messaging::{KafkaWriteGateway, ResponsePublisher};
use service::CancelsService;
use utils::{retry_on_transient, RetryConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging, overridable with RUST_LOG
    // Example: RUST_LOG=orders_cancels=trace
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,orders_cancels=debug")),
        )
        .init();

    tracing::info!("Starting orders cancellation service");

    let config = Config::from_env()?;

    // === 1. Metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!(
        "Metrics registry created with {} metrics",
        metrics.registry().gather().len()
    );

    let metrics_registry = Arc::new(metrics.registry().clone());
    let metrics_port = config.metrics_port;
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("Metrics runtime error: {}", e);
                return;
            }
        };
        rt.block_on(async {
            if let Err(e) = metrics::start_metrics_server(metrics_registry, metrics_port).await {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    });

    // === 2. Read side (MySQL) ===
    tracing::info!("Connecting to MySQL...");
    let database = config.database.clone();
    let pool = retry_on_transient(RetryConfig::default(), |attempt| {
        let database = database.clone();
        async move {
            tracing::debug!(attempt, "Opening MySQL pool");
            MySqlPoolOptions::new()
                .max_connections(database.max_connections)
                .connect(&database.url)
                .await
        }
    })
    .await
    .into_result()?;
    let reader = Arc::new(MySqlReadGateway::new(pool));

    // === 3. Write side (Kafka request/reply) ===
    let writer = Arc::new(KafkaWriteGateway::new(&config.broker, metrics.clone())?);
    let publisher = ResponsePublisher::new(&config.broker)?;

    // === 4. Request loop ===
    let caller = CancelsCaller::new(reader, writer, metrics.clone());
    let service = CancelsService::new(&config.broker, caller, publisher)?;

    tokio::select! {
        result = service.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Orders cancellation service stopped");

    Ok(())
}
