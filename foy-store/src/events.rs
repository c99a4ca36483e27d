use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use tracing::{debug, error};

use foy_core::repository::{EventSink, RepoResult};
use foy_shared::models::events::AdTrackedEvent;

/// Publishes live impressions and clicks for downstream reporting.
#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
    tracking_topic: String,
}

impl EventProducer {
    pub fn new(brokers: &str, tracking_topic: &str) -> Result<Self, KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self {
            producer,
            tracking_topic: tracking_topic.to_string(),
        })
    }

    pub fn tracking_topic(&self) -> &str {
        &self.tracking_topic
    }

    /// Keyed by ad id so one ad's events stay on one partition.
    async fn send(&self, key: &str, payload: &str) -> Result<(), KafkaError> {
        let record = FutureRecord::to(&self.tracking_topic).key(key).payload(payload);

        match self.producer.send(record, Timeout::After(Duration::ZERO)).await {
            Ok(delivery) => {
                debug!(
                    "Tracked event for {} on {}: partition {} offset {}",
                    key, self.tracking_topic, delivery.partition, delivery.offset
                );
                Ok(())
            }
            Err((e, _)) => {
                error!("Failed to publish tracked event for {}: {}", key, e);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl EventSink for EventProducer {
    async fn publish_tracked(&self, event: &AdTrackedEvent) -> RepoResult<()> {
        let payload = serde_json::to_string(event)?;
        self.send(&event.ad_id, &payload).await?;
        Ok(())
    }
}
