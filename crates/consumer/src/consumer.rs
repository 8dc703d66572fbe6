//! AMQP connection manager and consumer loop.
//!
//! Owns the broker connection/channel lifecycle: each session connects,
//! asserts the durable queue, sets prefetch to 1, and consumes until the
//! connection fails or shutdown is requested. A failed session is retried
//! after a fixed delay, unconditionally and without limit — no backoff, no
//! jitter, no attempt cap. Requeue (message-level) and reconnect
//! (connection-level) stay independent mechanisms.

use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use lapin::message::Delivery;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties};
use tokio_util::sync::CancellationToken;

use bookpulse_common::config::AppConfig;
use bookpulse_engine::dispatch::Dispatch;
use bookpulse_engine::error::Disposition;
use bookpulse_engine::processor::NotificationProcessor;

const CONSUMER_TAG: &str = "bookpulse-consumer";

/// Consumes booking messages from the durable queue and feeds them to the
/// processor, one at a time.
pub struct QueueConsumer<D> {
    config: AppConfig,
    processor: NotificationProcessor<D>,
}

impl<D: Dispatch> QueueConsumer<D> {
    pub fn new(config: AppConfig, processor: NotificationProcessor<D>) -> Self {
        Self { config, processor }
    }

    /// Run the consumer until `shutdown` fires.
    pub async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let delay = Duration::from_secs(self.config.reconnect_delay_secs);
        supervise(|| self.session(&shutdown), delay, &shutdown).await;
        Ok(())
    }

    /// One connection lifetime: connect, subscribe, consume deliveries until
    /// the connection fails or shutdown is requested, then close channel and
    /// connection in order.
    async fn session(&self, shutdown: &CancellationToken) -> anyhow::Result<()> {
        let (connection, channel) = self.connect().await?;

        let mut consumer = channel
            .basic_consume(
                &self.config.amqp_queue,
                CONSUMER_TAG,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;
        tracing::info!(queue = %self.config.amqp_queue, "Consumer subscribed");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                delivery = consumer.next() => match delivery {
                    Some(Ok(delivery)) => self.handle_delivery(delivery).await?,
                    Some(Err(e)) => return Err(e.into()),
                    None => anyhow::bail!("consumer stream closed by broker"),
                },
            }
        }

        tracing::info!("Shutting down, closing channel and connection");
        channel.close(200, "shutting down").await.ok();
        connection.close(200, "shutting down").await.ok();
        Ok(())
    }

    async fn connect(&self) -> anyhow::Result<(Connection, Channel)> {
        let connection =
            Connection::connect(&self.config.amqp_url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

        channel
            .queue_declare(
                &self.config.amqp_queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;

        // One unacknowledged message at a time: strictly serial processing
        // with natural backpressure from the broker.
        channel.basic_qos(1, BasicQosOptions::default()).await?;

        tracing::info!(queue = %self.config.amqp_queue, "Connected to broker");
        Ok((connection, channel))
    }

    /// Process one delivery and settle it per the processor's disposition.
    ///
    /// Settlement errors are connection-level failures and bubble up to the
    /// supervision loop.
    async fn handle_delivery(&self, delivery: Delivery) -> anyhow::Result<()> {
        let disposition = match self.processor.process(&delivery.data).await {
            Ok(record) => {
                tracing::info!(
                    notification_id = %record.id,
                    booking_id = record.booking_id,
                    "Message processed"
                );
                Disposition::Ack
            }
            Err(e) => {
                let disposition = e.disposition();
                tracing::warn!(
                    error = %e,
                    disposition = ?disposition,
                    "Message processing failed"
                );
                disposition
            }
        };

        match disposition {
            Disposition::Ack | Disposition::Drop => {
                delivery.ack(BasicAckOptions::default()).await?;
            }
            Disposition::Requeue => {
                delivery
                    .nack(BasicNackOptions {
                        requeue: true,
                        ..BasicNackOptions::default()
                    })
                    .await?;
            }
        }

        Ok(())
    }
}

/// Drive `session` repeatedly until `shutdown` fires, sleeping the fixed
/// `delay` after every failed session.
///
/// A session returning `Ok` means it exited on shutdown; any error schedules
/// a full reconnect.
async fn supervise<F, Fut>(mut session: F, delay: Duration, shutdown: &CancellationToken)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    loop {
        if shutdown.is_cancelled() {
            return;
        }

        match session().await {
            Ok(()) => return,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    delay_secs = delay.as_secs(),
                    "Broker session failed, reconnecting after fixed delay"
                );
            }
        }

        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
