use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::mysql::{MySql, MySqlPool};
use sqlx::QueryBuilder;

use super::read::{HeaderQuery, ReadError, ReadGateway};
use crate::domain::cancels::{
    CancellationFlag, Header, Item, ItemScheduleLine, ProductStock, StockKey, StockLevel,
};

// ============================================================================
// MySQL Read Gateway
// ============================================================================

const HEADER_TABLE: &str = "data_platform_orders_header_data";
const ITEM_TABLE: &str = "data_platform_orders_item_data";
const SCHEDULE_LINE_TABLE: &str = "data_platform_orders_item_schedule_line_data";
const STOCK_TABLE: &str = "data_platform_product_stock_product_stock_availability_data";
const STOCK_BY_BATCH_TABLE: &str = "data_platform_product_stock_product_stock_avail_by_btch";

type ScheduleLineRow = (
    i32,
    i32,
    i32,
    String,
    i32,
    String,
    Option<String>,
    Option<NaiveDate>,
    Option<f32>,
    Option<bool>,
);

type StockRow = (String, i32, String, NaiveDate, f32);
type StockByBatchRow = (String, i32, String, String, NaiveDate, f32);

pub struct MySqlReadGateway {
    pool: MySqlPool,
}

impl MySqlReadGateway {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadGateway for MySqlReadGateway {
    async fn header(&self, query: &HeaderQuery) -> Result<Option<Header>, ReadError> {
        let mut builder = QueryBuilder::<MySql>::new(format!(
            "SELECT header.OrderID FROM {HEADER_TABLE} AS header WHERE header.OrderID = "
        ));
        builder.push_bind(query.order_id);

        if let Some(status) = &query.header_delivery_status {
            builder
                .push(" AND header.HeaderDeliveryStatus = ")
                .push_bind(status.clone());
        }

        builder
            .push(" AND (header.Buyer = ")
            .push_bind(query.business_partner)
            .push(" OR header.Seller = ")
            .push_bind(query.business_partner)
            .push(")");

        let row: Option<(i32,)> = builder
            .build_query_as()
            .fetch_optional(&self.pool)
            .await?;

        tracing::debug!(order_id = query.order_id, found = row.is_some(), "Read order header");

        Ok(row.map(|(order_id,)| Header {
            order_id,
            header_delivery_status: None,
            is_cancelled: CancellationFlag::Unset,
        }))
    }

    async fn items(&self, order_id: i32, business_partner: i32) -> Result<Vec<Item>, ReadError> {
        let sql = format!(
            "SELECT item.OrderID, item.OrderItem
             FROM {ITEM_TABLE} AS item
             INNER JOIN {HEADER_TABLE} AS header ON header.OrderID = item.OrderID
             WHERE header.OrderID = ? AND (header.Buyer = ? OR header.Seller = ?)
             ORDER BY item.OrderItem"
        );

        let rows: Vec<(i32, i32)> = sqlx::query_as(&sql)
            .bind(order_id)
            .bind(business_partner)
            .bind(business_partner)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(order_id, count = rows.len(), "Read order items");

        Ok(rows
            .into_iter()
            .map(|(order_id, order_item)| Item {
                order_id,
                order_item,
                item_delivery_status: None,
                is_cancelled: CancellationFlag::Unset,
            })
            .collect())
    }

    async fn schedule_lines(
        &self,
        order_id: i32,
        business_partner: i32,
    ) -> Result<Vec<ItemScheduleLine>, ReadError> {
        let sql = format!(
            "SELECT line.OrderID, line.OrderItem, line.ScheduleLine, line.Product,
                    line.StockConfirmationBusinessPartner, line.StockConfirmationPlant,
                    line.StockConfirmationPlantBatch, line.RequestedDeliveryDate,
                    line.ConfirmedOrderQuantityByPDTAvailCheckInBaseUnit, line.IsCancelled
             FROM {SCHEDULE_LINE_TABLE} AS line
             INNER JOIN {HEADER_TABLE} AS header ON header.OrderID = line.OrderID
             WHERE header.OrderID = ? AND (header.Buyer = ? OR header.Seller = ?)
             ORDER BY line.OrderItem, line.ScheduleLine"
        );

        let rows: Vec<ScheduleLineRow> = sqlx::query_as(&sql)
            .bind(order_id)
            .bind(business_partner)
            .bind(business_partner)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(order_id, count = rows.len(), "Read order schedule lines");

        Ok(rows.into_iter().map(schedule_line_from_row).collect())
    }

    async fn product_stock(&self, key: &StockKey) -> Result<Option<ProductStock>, ReadError> {
        let stock = match (key.level(), &key.batch) {
            (StockLevel::Batch, Some(batch)) => {
                let sql = format!(
                    "SELECT Product, BusinessPartner, Plant, Batch, ProductStockAvailabilityDate,
                            AvailableProductStock
                     FROM {STOCK_BY_BATCH_TABLE}
                     WHERE Product = ? AND BusinessPartner = ? AND Plant = ? AND Batch = ?
                       AND ProductStockAvailabilityDate = ?"
                );
                let row: Option<StockByBatchRow> = sqlx::query_as(&sql)
                    .bind(&key.product)
                    .bind(key.business_partner)
                    .bind(&key.plant)
                    .bind(batch)
                    .bind(key.availability_date)
                    .fetch_optional(&self.pool)
                    .await?;

                row.map(|(product, business_partner, plant, batch, date, available)| ProductStock {
                    product,
                    business_partner,
                    plant,
                    batch: Some(batch),
                    product_stock_availability_date: date,
                    available_product_stock: available,
                })
            }
            _ => {
                let sql = format!(
                    "SELECT Product, BusinessPartner, Plant, ProductStockAvailabilityDate,
                            AvailableProductStock
                     FROM {STOCK_TABLE}
                     WHERE Product = ? AND BusinessPartner = ? AND Plant = ?
                       AND ProductStockAvailabilityDate = ?"
                );
                let row: Option<StockRow> = sqlx::query_as(&sql)
                    .bind(&key.product)
                    .bind(key.business_partner)
                    .bind(&key.plant)
                    .bind(key.availability_date)
                    .fetch_optional(&self.pool)
                    .await?;

                row.map(|(product, business_partner, plant, date, available)| ProductStock {
                    product,
                    business_partner,
                    plant,
                    batch: None,
                    product_stock_availability_date: date,
                    available_product_stock: available,
                })
            }
        };

        tracing::debug!(
            product = %key.product,
            plant = %key.plant,
            level = key.level().as_str(),
            found = stock.is_some(),
            "Read product stock availability"
        );

        Ok(stock)
    }
}

fn schedule_line_from_row(row: ScheduleLineRow) -> ItemScheduleLine {
    let (
        order_id,
        order_item,
        schedule_line,
        product,
        business_partner,
        plant,
        batch,
        requested_delivery_date,
        confirmed_quantity,
        is_cancelled,
    ) = row;

    ItemScheduleLine {
        order_id,
        order_item,
        schedule_line,
        product: Some(product),
        stock_confirmation_business_partner: Some(business_partner),
        stock_confirmation_plant: Some(plant),
        stock_confirmation_plant_batch: batch,
        requested_delivery_date,
        confirmed_order_quantity_by_pdt_avail_check_in_base_unit: confirmed_quantity,
        is_cancelled: is_cancelled.into(),
    }
}
