// ============================================================================
// Cancels Domain - order cancellation cascade
// ============================================================================
//
// - Value objects (CancellationFlag, Accepter, StockDirection)
// - Records (Header, Item, ItemScheduleLine, ProductStock, StockKey)
// - Request / response documents
// - Errors (CancelError)
// - Stock resolver and reservation/release calculator
// - Cascade controller per accepter granularity
// - Caller aggregating branch results into one response
//
// ============================================================================

pub mod value_objects;
pub mod records;
pub mod requests;
pub mod errors;
pub mod stock;
pub mod cascade;
pub mod caller;

#[cfg(test)]
pub(crate) mod testing;

pub use value_objects::*;
pub use records::*;
pub use requests::*;
pub use errors::*;
pub use stock::*;
pub use cascade::*;
pub use caller::*;
