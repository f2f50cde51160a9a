use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

// ============================================================================
// Write Gateway - persistence boundary
// ============================================================================
//
// Every record update is handed to an out-of-process writer and is only
// considered applied once the writer replies with `result == "success"`.
//
// ============================================================================

/// Writer-side handler a record is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WriteFunction {
    OrdersHeader,
    OrdersItem,
    OrdersItemScheduleLine,
    ProductStockAvailability,
    ProductStockAvailabilityByBatch,
}

impl WriteFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteFunction::OrdersHeader => "OrdersHeader",
            WriteFunction::OrdersItem => "OrdersItem",
            WriteFunction::OrdersItemScheduleLine => "OrdersItemScheduleLine",
            WriteFunction::ProductStockAvailability => "ProductStockAvailability",
            WriteFunction::ProductStockAvailabilityByBatch => "ProductStockAvailabilityByBatch",
        }
    }

    /// Reason string surfaced when a write to this function fails.
    pub fn failure_reason(&self) -> &'static str {
        match self {
            WriteFunction::OrdersHeader => "Header Data cannot cancel",
            WriteFunction::OrdersItem => "Order Item Data cannot cancel",
            WriteFunction::OrdersItemScheduleLine => "Order Item Schedule Line Data cannot cancel",
            WriteFunction::ProductStockAvailability => {
                "Product Stock Availability Data cannot update"
            }
            WriteFunction::ProductStockAvailabilityByBatch => {
                "Product Stock Availability By Batch Data cannot update"
            }
        }
    }
}

impl fmt::Display for WriteFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope sent to the writer.
#[derive(Debug, Clone, Serialize)]
pub struct WriteRequest<'a> {
    pub message: &'a Value,
    pub function: WriteFunction,
    pub runtime_session_id: &'a str,
}

/// Acknowledgement of an applied write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteAck;

impl WriteAck {
    /// Accept a writer reply only if it carries `result: "success"`.
    pub fn from_reply(reply: Value) -> Result<Self, WriteFailure> {
        match reply.get("result") {
            Some(Value::String(result)) if result == "success" => Ok(WriteAck),
            Some(Value::String(result)) => Err(WriteFailure::Rejected(Some(result.clone()))),
            Some(other) => Err(WriteFailure::Rejected(Some(other.to_string()))),
            None => Err(WriteFailure::Rejected(None)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WriteFailure {
    #[error("writer rejected the update (result: {0:?})")]
    Rejected(Option<String>),

    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait WriteGateway: Send + Sync {
    async fn apply(
        &self,
        session_id: &str,
        function: WriteFunction,
        message: Value,
    ) -> Result<WriteAck, WriteFailure>;
}
