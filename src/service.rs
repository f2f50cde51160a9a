use anyhow::Result;
use futures_util::StreamExt;
use rdkafka::{
    config::ClientConfig,
    consumer::{CommitMode, Consumer, StreamConsumer},
    message::Message,
};

use crate::config::BrokerConfig;
use crate::domain::cancels::{CancelsCaller, CancelsRequest, CancelsResponse};
use crate::messaging::{PublishError, ResponsePublisher, ResponseSink};
use crate::utils::{retry_on_transient, RetryConfig};

// ============================================================================
// Cancels Service - consumes requests and publishes responses
// ============================================================================
//
// Requests are handled one at a time in arrival order. An offset is
// committed once the response for that request has been published. A payload
// that does not decode is logged and skipped.
//
// Publishing retries the computed response; the cascade never runs twice for
// one delivery. If the response still cannot be published the loop stops
// with an error before any later offset is committed.
//
// ============================================================================

pub struct CancelsService {
    consumer: StreamConsumer,
    caller: CancelsCaller,
    publisher: ResponsePublisher,
    publish_retry: RetryConfig,
}

impl CancelsService {
    pub fn new(
        config: &BrokerConfig,
        caller: CancelsCaller,
        publisher: ResponsePublisher,
    ) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .create()?;
        consumer.subscribe(&[config.input_topic.as_str()])?;

        tracing::info!(
            topic = %config.input_topic,
            group_id = %config.group_id,
            "Subscribed to cancellation requests"
        );

        Ok(Self {
            consumer,
            caller,
            publisher,
            publish_retry: RetryConfig::default(),
        })
    }

    pub async fn run(&self) -> Result<()> {
        let mut stream = self.consumer.stream();

        while let Some(received) = stream.next().await {
            let message = match received {
                Ok(message) => message,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to receive request");
                    continue;
                }
            };

            match decode_request(message.payload()) {
                Ok(request) => {
                    let response = self.caller.process(&request).await;
                    let delivered =
                        deliver(&self.publisher, &response, self.publish_retry.clone()).await;
                    if let Err(e) = delivered {
                        tracing::error!(
                            error = %e,
                            session_id = %response.runtime_session_id,
                            partition = message.partition(),
                            offset = message.offset(),
                            "Response not published, stopping before the offset is committed"
                        );
                        return Err(e.into());
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        partition = message.partition(),
                        offset = message.offset(),
                        "Skipping undecodable request"
                    );
                }
            }

            if let Err(e) = self.consumer.commit_message(&message, CommitMode::Async) {
                tracing::warn!(error = %e, "Failed to commit request offset");
            }
        }

        Ok(())
    }
}

/// Publish an already computed response, retrying transient send failures.
async fn deliver(
    sink: &dyn ResponseSink,
    response: &CancelsResponse,
    retry: RetryConfig,
) -> Result<(), PublishError> {
    retry_on_transient(retry, |_attempt| sink.publish(response))
        .await
        .into_result()
}

fn decode_request(payload: Option<&[u8]>) -> Result<CancelsRequest> {
    let payload = payload.ok_or_else(|| anyhow::anyhow!("empty payload"))?;
    Ok(serde_json::from_slice(payload)?)
}
