use async_trait::async_trait;

use crate::domain::cancels::{Header, Item, ItemScheduleLine, ProductStock, StockKey};

// ============================================================================
// Read Gateway - query side of the relational store
// ============================================================================
//
// "No rows" is a successful read (`None` / empty `Vec`); only query and
// decode problems are errors.
//
// ============================================================================

/// Header lookup, always scoped to orders where the partner is buyer or seller.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderQuery {
    pub order_id: i32,
    pub business_partner: i32,
    pub header_delivery_status: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Failed to decode row: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for ReadError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::Decode(_) => ReadError::Decode(error.to_string()),
            other => ReadError::Query(other.to_string()),
        }
    }
}

#[async_trait]
pub trait ReadGateway: Send + Sync {
    async fn header(&self, query: &HeaderQuery) -> Result<Option<Header>, ReadError>;

    async fn items(&self, order_id: i32, business_partner: i32) -> Result<Vec<Item>, ReadError>;

    /// Every schedule line on the order, across all items.
    async fn schedule_lines(
        &self,
        order_id: i32,
        business_partner: i32,
    ) -> Result<Vec<ItemScheduleLine>, ReadError>;

    /// Plant-level or plant+batch-level record depending on `key.level()`.
    async fn product_stock(&self, key: &StockKey) -> Result<Option<ProductStock>, ReadError>;
}
