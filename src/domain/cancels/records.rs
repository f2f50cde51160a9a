use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::value_objects::CancellationFlag;
use crate::gateway::WriteFunction;

// ============================================================================
// Order Records - request-scoped rows read from and written back to the store
// ============================================================================
//
// Field names on the wire match the store's column names. Optional columns a
// record does not carry are omitted so a partial record only touches the
// columns it names.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(rename = "OrderID")]
    pub order_id: i32,
    #[serde(rename = "HeaderDeliveryStatus", default, skip_serializing_if = "Option::is_none")]
    pub header_delivery_status: Option<String>,
    #[serde(rename = "IsCancelled", default)]
    pub is_cancelled: CancellationFlag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "OrderID")]
    pub order_id: i32,
    #[serde(rename = "OrderItem")]
    pub order_item: i32,
    #[serde(rename = "ItemDeliveryStatus", default, skip_serializing_if = "Option::is_none")]
    pub item_delivery_status: Option<String>,
    #[serde(rename = "IsCancelled", default)]
    pub is_cancelled: CancellationFlag,
}

/// Item update sent by the item branch. `ItemDeliveryStatus` is always on
/// the wire as `null` so the writer clears the column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemCancellation {
    #[serde(rename = "OrderID")]
    pub order_id: i32,
    #[serde(rename = "OrderItem")]
    pub order_item: i32,
    #[serde(rename = "ItemDeliveryStatus")]
    item_delivery_status: Option<String>,
    #[serde(rename = "IsCancelled")]
    pub is_cancelled: CancellationFlag,
}

impl ItemCancellation {
    pub fn new(order_id: i32, order_item: i32, is_cancelled: CancellationFlag) -> Self {
        Self {
            order_id,
            order_item,
            item_delivery_status: None,
            is_cancelled,
        }
    }
}

impl From<ItemCancellation> for Item {
    fn from(update: ItemCancellation) -> Self {
        Item {
            order_id: update.order_id,
            order_item: update.order_item,
            item_delivery_status: None,
            is_cancelled: update.is_cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemScheduleLine {
    #[serde(rename = "OrderID")]
    pub order_id: i32,
    #[serde(rename = "OrderItem")]
    pub order_item: i32,
    #[serde(rename = "ScheduleLine")]
    pub schedule_line: i32,
    #[serde(rename = "Product", default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(
        rename = "StockConfirmationBusinessPartner",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub stock_confirmation_business_partner: Option<i32>,
    #[serde(rename = "StockConfirmationPlant", default, skip_serializing_if = "Option::is_none")]
    pub stock_confirmation_plant: Option<String>,
    #[serde(
        rename = "StockConfirmationPlantBatch",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub stock_confirmation_plant_batch: Option<String>,
    #[serde(rename = "RequestedDeliveryDate", default, skip_serializing_if = "Option::is_none")]
    pub requested_delivery_date: Option<NaiveDate>,
    #[serde(
        rename = "ConfirmedOrderQuantityByPDTAvailCheckInBaseUnit",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub confirmed_order_quantity_by_pdt_avail_check_in_base_unit: Option<f32>,
    #[serde(rename = "IsCancelled", default)]
    pub is_cancelled: CancellationFlag,
}

impl ItemScheduleLine {
    /// Record carrying only identity and the cancellation flag.
    pub fn cancellation_only(
        order_id: i32,
        order_item: i32,
        schedule_line: i32,
        is_cancelled: CancellationFlag,
    ) -> Self {
        Self {
            order_id,
            order_item,
            schedule_line,
            is_cancelled,
            ..Default::default()
        }
    }

    /// Quantity currently held against stock; absent means nothing is held.
    pub fn confirmed_quantity(&self) -> f32 {
        self.confirmed_order_quantity_by_pdt_avail_check_in_base_unit
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductStock {
    #[serde(rename = "Product")]
    pub product: String,
    #[serde(rename = "BusinessPartner")]
    pub business_partner: i32,
    #[serde(rename = "Plant")]
    pub plant: String,
    #[serde(rename = "Batch", default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    #[serde(rename = "ProductStockAvailabilityDate")]
    pub product_stock_availability_date: NaiveDate,
    #[serde(rename = "AvailableProductStock")]
    pub available_product_stock: f32,
}

impl ProductStock {
    pub fn with_available(&self, available_product_stock: f32) -> Self {
        Self {
            available_product_stock,
            ..self.clone()
        }
    }

    pub fn level(&self) -> StockLevel {
        match self.batch {
            Some(_) => StockLevel::Batch,
            None => StockLevel::Plant,
        }
    }
}

// ============================================================================
// Stock Lookup Key
// ============================================================================

/// Shape of the stock record a schedule line reconciles against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    Plant,
    Batch,
}

impl StockLevel {
    pub fn write_function(&self) -> WriteFunction {
        match self {
            StockLevel::Plant => WriteFunction::ProductStockAvailability,
            StockLevel::Batch => WriteFunction::ProductStockAvailabilityByBatch,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockLevel::Plant => "plant",
            StockLevel::Batch => "batch",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockKey {
    pub product: String,
    pub business_partner: i32,
    pub plant: String,
    pub batch: Option<String>,
    pub availability_date: NaiveDate,
}

impl StockKey {
    /// Key for the line's stock record, or `None` when the line lacks a
    /// component of the key.
    pub fn for_schedule_line(line: &ItemScheduleLine) -> Option<Self> {
        Some(Self {
            product: line.product.clone()?,
            business_partner: line.stock_confirmation_business_partner?,
            plant: line.stock_confirmation_plant.clone()?,
            batch: line.stock_confirmation_plant_batch.clone(),
            availability_date: line.requested_delivery_date?,
        })
    }

    pub fn level(&self) -> StockLevel {
        match self.batch {
            Some(_) => StockLevel::Batch,
            None => StockLevel::Plant,
        }
    }
}
