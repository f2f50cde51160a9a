use anyhow::Result;
use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    consumer::{Consumer, StreamConsumer},
    error::{KafkaError, KafkaResult},
    message::{BorrowedMessage, Message},
    producer::{FutureProducer, FutureRecord},
    util::Timeout,
    Offset, TopicPartitionList,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::BrokerConfig;
use crate::domain::cancels::CancelsResponse;
use crate::gateway::{WriteAck, WriteFailure, WriteFunction, WriteGateway, WriteRequest};
use crate::metrics::Metrics;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, IsTransient};

// ============================================================================
// Kafka Write Gateway - request/reply over two topics
// ============================================================================
//
// Each write is produced to the request topic keyed by a fresh correlation
// id. The writer answers on the reply topic with the same key; a background
// listener hands the reply to the waiting call. A write that sees no reply
// within the configured timeout fails as a transport error.
//
// The listener is assigned every reply partition at its current end offset
// before the first write can be sent, so no reply to this instance is
// produced ahead of its read position. It never commits offsets.
//
// ============================================================================

const SEND_TIMEOUT: Duration = Duration::from_secs(5);
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

type PendingReplies = Arc<Mutex<HashMap<String, oneshot::Sender<Value>>>>;

pub struct KafkaWriteGateway {
    producer: FutureProducer,
    request_topic: String,
    reply_timeout: Duration,
    pending: PendingReplies,
    circuit_breaker: CircuitBreaker,
    metrics: Arc<Metrics>,
    listener: JoinHandle<()>,
}

impl KafkaWriteGateway {
    pub fn new(config: &BrokerConfig, metrics: Arc<Metrics>) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        // Every instance reads the whole reply topic and keeps only its own keys
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", format!("{}-replies", config.group_id))
            .set("enable.auto.commit", "false")
            .create()?;
        let assignment = position_at_end(&consumer, &config.write_reply_topic)?;
        consumer.assign(&assignment)?;

        let pending: PendingReplies = Arc::new(Mutex::new(HashMap::new()));
        let listener = tokio::spawn(listen_for_replies(consumer, pending.clone()));

        tracing::info!(
            request_topic = %config.write_request_topic,
            reply_topic = %config.write_reply_topic,
            reply_partitions = assignment.count(),
            "Write gateway connected"
        );

        Ok(Self {
            producer,
            request_topic: config.write_request_topic.clone(),
            reply_timeout: config.reply_timeout,
            pending,
            circuit_breaker: CircuitBreaker::new(CircuitBreakerConfig::default()),
            metrics,
            listener,
        })
    }

    async fn round_trip(&self, correlation_id: &str, payload: &str) -> Result<Value, String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending
            .lock()
            .await
            .insert(correlation_id.to_string(), reply_tx);

        let record = FutureRecord::to(&self.request_topic)
            .key(correlation_id)
            .payload(payload);

        if let Err((e, _)) = self.producer.send(record, Timeout::After(SEND_TIMEOUT)).await {
            self.pending.lock().await.remove(correlation_id);
            return Err(format!("Kafka send error: {}", e));
        }

        match tokio::time::timeout(self.reply_timeout, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err("reply listener stopped".to_string()),
            Err(_) => {
                self.pending.lock().await.remove(correlation_id);
                Err(format!("no reply within {:?}", self.reply_timeout))
            }
        }
    }
}

#[async_trait]
impl WriteGateway for KafkaWriteGateway {
    async fn apply(
        &self,
        session_id: &str,
        function: WriteFunction,
        message: Value,
    ) -> Result<WriteAck, WriteFailure> {
        let correlation_id = Uuid::new_v4().to_string();
        let payload = serde_json::to_string(&WriteRequest {
            message: &message,
            function,
            runtime_session_id: session_id,
        })
        .map_err(|e| WriteFailure::Transport(e.to_string()))?;

        let outcome = self
            .circuit_breaker
            .call(function, async {
                let reply = self
                    .round_trip(&correlation_id, &payload)
                    .await
                    .map_err(WriteFailure::Transport)?;
                WriteAck::from_reply(reply)
            })
            .await;
        self.metrics
            .update_circuit_breaker_state(self.circuit_breaker.get_state().await);

        let label = match &outcome {
            Ok(_) => "success",
            Err(WriteFailure::Rejected(_)) => "rejected",
            Err(WriteFailure::Transport(_)) => "transport_error",
        };
        self.metrics.record_write(function, label);

        tracing::debug!(
            function = %function,
            correlation_id = %correlation_id,
            outcome = label,
            "Write round trip finished"
        );

        outcome
    }
}

impl Drop for KafkaWriteGateway {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Assignment of every partition of `topic` at its current high watermark.
fn position_at_end(consumer: &StreamConsumer, topic: &str) -> Result<TopicPartitionList> {
    let metadata = consumer.fetch_metadata(Some(topic), METADATA_TIMEOUT)?;
    let partitions: Vec<i32> = metadata
        .topics()
        .iter()
        .filter(|t| t.name() == topic)
        .flat_map(|t| t.partitions().iter().map(|p| p.id()))
        .collect();
    if partitions.is_empty() {
        anyhow::bail!("reply topic {} has no partitions", topic);
    }

    let mut ends = Vec::with_capacity(partitions.len());
    for partition in partitions {
        let (_, high) = consumer.fetch_watermarks(topic, partition, METADATA_TIMEOUT)?;
        ends.push((partition, high));
    }

    Ok(reply_assignment(topic, &ends)?)
}

fn reply_assignment(topic: &str, ends: &[(i32, i64)]) -> KafkaResult<TopicPartitionList> {
    let mut assignment = TopicPartitionList::with_capacity(ends.len());
    for &(partition, high) in ends {
        assignment.add_partition_offset(topic, partition, Offset::Offset(high))?;
    }
    Ok(assignment)
}

async fn listen_for_replies(consumer: StreamConsumer, pending: PendingReplies) {
    loop {
        let reply = match consumer.recv().await {
            Ok(message) => decode_reply(&message),
            Err(e) => {
                tracing::error!(error = %e, "Failed to receive writer reply");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };

        let Some((correlation_id, body)) = reply else {
            continue;
        };

        match pending.lock().await.remove(&correlation_id) {
            Some(waiting) => {
                let _ = waiting.send(body);
            }
            None => tracing::debug!(
                correlation_id = %correlation_id,
                "Reply with no waiting write"
            ),
        }
    }
}

/// Key and body of a reply. An unparsable body becomes `Value::Null` so the
/// waiting write fails as rejected instead of timing out.
fn decode_reply(message: &BorrowedMessage<'_>) -> Option<(String, Value)> {
    let key = message.key().and_then(|k| std::str::from_utf8(k).ok())?;
    Some((key.to_string(), parse_reply_body(message.payload())))
}

fn parse_reply_body(payload: Option<&[u8]>) -> Value {
    payload
        .and_then(|bytes| serde_json::from_slice(bytes).ok())
        .unwrap_or(Value::Null)
}

// ============================================================================
// Response Publisher
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("response encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Kafka send error: {0}")]
    Send(#[from] KafkaError),
}

impl IsTransient for PublishError {
    fn is_transient(&self) -> bool {
        matches!(self, PublishError::Send(_))
    }
}

/// Destination for finished response documents.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    async fn publish(&self, response: &CancelsResponse) -> Result<(), PublishError>;
}

pub struct ResponsePublisher {
    producer: FutureProducer,
    topic: String,
}

impl ResponsePublisher {
    pub fn new(config: &BrokerConfig) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self {
            producer,
            topic: config.output_topic.clone(),
        })
    }
}

#[async_trait]
impl ResponseSink for ResponsePublisher {
    async fn publish(&self, response: &CancelsResponse) -> Result<(), PublishError> {
        let payload = serde_json::to_string(response)?;
        let record = FutureRecord::to(&self.topic)
            .key(&response.runtime_session_id)
            .payload(&payload);

        self.producer
            .send(record, Timeout::After(SEND_TIMEOUT))
            .await
            .map_err(|(e, _)| PublishError::Send(e))?;

        tracing::info!(
            topic = %self.topic,
            session_id = %response.runtime_session_id,
            sql_update_result = ?response.sql_update_result,
            "Published cancellation response"
        );

        Ok(())
    }
}
