use tokio_util::sync::CancellationToken;

use bookpulse_common::config::AppConfig;
use bookpulse_common::db;
use bookpulse_consumer::consumer::QueueConsumer;
use bookpulse_engine::dispatch::ChannelRouter;
use bookpulse_engine::processor::NotificationProcessor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookpulse_consumer=info,bookpulse_engine=info".into()),
        )
        .json()
        .init();

    tracing::info!("BookPulse consumer starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to database
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let processor = NotificationProcessor::new(pool, ChannelRouter::new());
    let consumer = QueueConsumer::new(config, processor);

    // Run with graceful shutdown on Ctrl+C
    let shutdown = CancellationToken::new();
    let worker = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { consumer.run(shutdown).await }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal, stopping gracefully...");
    shutdown.cancel();
    worker.await??;

    tracing::info!("BookPulse consumer stopped.");
    Ok(())
}
