use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::Mutex;

use super::records::{Header, Item, ItemScheduleLine, ProductStock, StockKey};
use super::requests::{CancelsRequest, ItemInput, OrdersInput, ScheduleLineInput};
use super::value_objects::{Accepter, CancellationFlag};
use crate::gateway::{
    HeaderQuery, ReadError, ReadGateway, WriteAck, WriteFailure, WriteFunction, WriteGateway,
};

// ============================================================================
// Test doubles for the read and write gateways
// ============================================================================

pub const ORDER_ID: i32 = 100;
/// Buyer on every fixture order.
pub const BUSINESS_PARTNER: i32 = 201;
/// Seller on every fixture order.
pub const SELLER: i32 = 301;
pub const SESSION_ID: &str = "sess-test";

pub fn availability_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, 2).unwrap()
}

pub fn header() -> Header {
    Header {
        order_id: ORDER_ID,
        header_delivery_status: None,
        is_cancelled: CancellationFlag::Unset,
    }
}

pub fn item(order_item: i32) -> Item {
    Item {
        order_id: ORDER_ID,
        order_item,
        item_delivery_status: None,
        is_cancelled: CancellationFlag::Unset,
    }
}

/// Plant-level line on the shared stock key.
pub fn schedule_line(order_item: i32, schedule_line: i32, confirmed: f32) -> ItemScheduleLine {
    ItemScheduleLine {
        order_id: ORDER_ID,
        order_item,
        schedule_line,
        product: Some("P-001".to_string()),
        stock_confirmation_business_partner: Some(BUSINESS_PARTNER),
        stock_confirmation_plant: Some("PL01".to_string()),
        stock_confirmation_plant_batch: None,
        requested_delivery_date: Some(availability_date()),
        confirmed_order_quantity_by_pdt_avail_check_in_base_unit: Some(confirmed),
        is_cancelled: CancellationFlag::Unset,
    }
}

pub fn plant_stock(available: f32) -> ProductStock {
    ProductStock {
        product: "P-001".to_string(),
        business_partner: BUSINESS_PARTNER,
        plant: "PL01".to_string(),
        batch: None,
        product_stock_availability_date: availability_date(),
        available_product_stock: available,
    }
}

pub fn request(accepter: Vec<Accepter>, is_cancelled: CancellationFlag) -> CancelsRequest {
    CancelsRequest {
        connection_key: "request".to_string(),
        runtime_session_id: SESSION_ID.to_string(),
        business_partner: BUSINESS_PARTNER,
        service_label: "ORDERS".to_string(),
        api_type: "cancels".to_string(),
        accepter,
        header: OrdersInput {
            order_id: ORDER_ID,
            header_delivery_status: None,
            is_cancelled,
            items: Vec::new(),
        },
    }
}

pub fn item_input(order_item: i32, is_cancelled: CancellationFlag) -> ItemInput {
    ItemInput {
        order_item,
        is_cancelled,
        schedule_lines: Vec::new(),
    }
}

pub fn schedule_line_input(schedule_line: i32, is_cancelled: CancellationFlag) -> ScheduleLineInput {
    ScheduleLineInput {
        schedule_line,
        is_cancelled,
    }
}

// ----------------------------------------------------------------------------
// In-memory read gateway
// ----------------------------------------------------------------------------

/// Header row with the parties that may see the order.
struct StoredHeader {
    header: Header,
    buyer: i32,
    seller: i32,
}

/// Scopes every read to orders where the requesting partner is buyer or seller.
#[derive(Default)]
pub struct InMemoryReadGateway {
    headers: Vec<StoredHeader>,
    items: Vec<Item>,
    schedule_lines: Vec<ItemScheduleLine>,
    stocks: Vec<ProductStock>,
    fail_reads: bool,
}

impl InMemoryReadGateway {
    pub fn with_header(self, header: Header) -> Self {
        self.with_header_between(header, BUSINESS_PARTNER, SELLER)
    }

    pub fn with_header_between(mut self, header: Header, buyer: i32, seller: i32) -> Self {
        self.headers.push(StoredHeader {
            header,
            buyer,
            seller,
        });
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_schedule_line(mut self, line: ItemScheduleLine) -> Self {
        self.schedule_lines.push(line);
        self
    }

    pub fn with_stock(mut self, stock: ProductStock) -> Self {
        self.stocks.push(stock);
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    fn visible(&self, order_id: i32, business_partner: i32) -> bool {
        self.headers.iter().any(|stored| {
            stored.header.order_id == order_id
                && (stored.buyer == business_partner || stored.seller == business_partner)
        })
    }

    fn check(&self) -> Result<(), ReadError> {
        if self.fail_reads {
            return Err(ReadError::Query("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReadGateway for InMemoryReadGateway {
    async fn header(&self, query: &HeaderQuery) -> Result<Option<Header>, ReadError> {
        self.check()?;
        Ok(self
            .headers
            .iter()
            .filter(|stored| stored.buyer == query.business_partner || stored.seller == query.business_partner)
            .map(|stored| &stored.header)
            .find(|h| {
                h.order_id == query.order_id
                    && (query.header_delivery_status.is_none()
                        || h.header_delivery_status == query.header_delivery_status)
            })
            .cloned())
    }

    async fn items(&self, order_id: i32, business_partner: i32) -> Result<Vec<Item>, ReadError> {
        self.check()?;
        if !self.visible(order_id, business_partner) {
            return Ok(Vec::new());
        }
        Ok(self
            .items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn schedule_lines(
        &self,
        order_id: i32,
        business_partner: i32,
    ) -> Result<Vec<ItemScheduleLine>, ReadError> {
        self.check()?;
        if !self.visible(order_id, business_partner) {
            return Ok(Vec::new());
        }
        Ok(self
            .schedule_lines
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn product_stock(&self, key: &StockKey) -> Result<Option<ProductStock>, ReadError> {
        self.check()?;
        Ok(self.stocks.iter().find(|s| key_matches(key, s)).cloned())
    }
}

fn key_matches(key: &StockKey, stock: &ProductStock) -> bool {
    key.product == stock.product
        && key.business_partner == stock.business_partner
        && key.plant == stock.plant
        && key.batch == stock.batch
        && key.availability_date == stock.product_stock_availability_date
}

// ----------------------------------------------------------------------------
// Recording write gateway
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub session_id: String,
    pub function: WriteFunction,
    pub message: Value,
}

/// Accepts every write unless told to fail the n-th (1-based) call of a
/// function.
#[derive(Default)]
pub struct RecordingWriteGateway {
    writes: Mutex<Vec<RecordedWrite>>,
    rejections: Vec<(WriteFunction, usize)>,
    transport_failures: Vec<(WriteFunction, usize)>,
}

impl RecordingWriteGateway {
    pub fn reject_nth(mut self, function: WriteFunction, nth: usize) -> Self {
        self.rejections.push((function, nth));
        self
    }

    pub fn fail_transport_nth(mut self, function: WriteFunction, nth: usize) -> Self {
        self.transport_failures.push((function, nth));
        self
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn messages_for(&self, function: WriteFunction) -> Vec<Value> {
        self.writes()
            .into_iter()
            .filter(|w| w.function == function)
            .map(|w| w.message)
            .collect()
    }

    pub fn count(&self, function: WriteFunction) -> usize {
        self.messages_for(function).len()
    }
}

#[async_trait]
impl WriteGateway for RecordingWriteGateway {
    async fn apply(
        &self,
        session_id: &str,
        function: WriteFunction,
        message: Value,
    ) -> Result<WriteAck, WriteFailure> {
        let nth = {
            let mut writes = self.writes.lock().unwrap();
            writes.push(RecordedWrite {
                session_id: session_id.to_string(),
                function,
                message,
            });
            writes.iter().filter(|w| w.function == function).count()
        };

        if self.transport_failures.contains(&(function, nth)) {
            return Err(WriteFailure::Transport("reply timed out".to_string()));
        }
        if self.rejections.contains(&(function, nth)) {
            return WriteAck::from_reply(json!({ "result": "failure" }));
        }
        WriteAck::from_reply(json!({ "result": "success" }))
    }
}
