use serde::{Deserialize, Serialize};

use super::records::{Header, Item, ItemScheduleLine, ProductStock};
use super::value_objects::{Accepter, CancellationFlag};

// ============================================================================
// Inbound request document
// ============================================================================

pub const CANCELS_API_TYPE: &str = "cancels";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelsRequest {
    #[serde(default)]
    pub connection_key: String,
    pub runtime_session_id: String,
    pub business_partner: i32,
    #[serde(default)]
    pub service_label: String,
    pub api_type: String,
    #[serde(default)]
    pub accepter: Vec<Accepter>,
    #[serde(rename = "Header")]
    pub header: OrdersInput,
}

/// The order as submitted, with the flags the caller wants applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersInput {
    #[serde(rename = "OrderID")]
    pub order_id: i32,
    #[serde(rename = "HeaderDeliveryStatus", default)]
    pub header_delivery_status: Option<String>,
    #[serde(rename = "IsCancelled", default)]
    pub is_cancelled: CancellationFlag,
    #[serde(rename = "Item", default)]
    pub items: Vec<ItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemInput {
    #[serde(rename = "OrderItem")]
    pub order_item: i32,
    #[serde(rename = "IsCancelled", default)]
    pub is_cancelled: CancellationFlag,
    #[serde(rename = "ItemSchedulingLine", default)]
    pub schedule_lines: Vec<ScheduleLineInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleLineInput {
    #[serde(rename = "ScheduleLine")]
    pub schedule_line: i32,
    #[serde(rename = "IsCancelled", default)]
    pub is_cancelled: CancellationFlag,
}

// ============================================================================
// Outbound response document
// ============================================================================

/// Records touched by the executed branches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "Header")]
    pub header: Option<Header>,
    #[serde(rename = "Item")]
    pub items: Vec<Item>,
    #[serde(rename = "ItemScheduleLine")]
    pub schedule_lines: Vec<ItemScheduleLine>,
    #[serde(rename = "ProductStock")]
    pub product_stocks: Vec<ProductStock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelsResponse {
    pub connection_key: String,
    pub runtime_session_id: String,
    pub business_partner: i32,
    pub service_label: String,
    pub api_type: String,
    pub accepter: Vec<Accepter>,
    pub message: Message,
    pub sql_update_result: Option<bool>,
    pub sql_update_error: String,
    pub api_processing_result: Option<bool>,
    pub api_processing_error: String,
}

impl CancelsResponse {
    pub fn for_request(request: &CancelsRequest) -> Self {
        Self {
            connection_key: request.connection_key.clone(),
            runtime_session_id: request.runtime_session_id.clone(),
            business_partner: request.business_partner,
            service_label: request.service_label.clone(),
            api_type: request.api_type.clone(),
            accepter: request.accepter.clone(),
            message: Message::default(),
            sql_update_result: None,
            sql_update_error: String::new(),
            api_processing_result: None,
            api_processing_error: String::new(),
        }
    }

    /// Record a write failure; the first reason wins.
    pub fn mark_update_failed(&mut self, reason: &str) {
        if self.sql_update_result == Some(false) {
            return;
        }
        self.sql_update_result = Some(false);
        self.sql_update_error = reason.to_string();
    }
}
