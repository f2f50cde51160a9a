pub mod kafka;

pub use kafka::{KafkaWriteGateway, PublishError, ResponsePublisher, ResponseSink};
