use super::errors::CancelError;
use super::records::{ItemScheduleLine, ProductStock, StockKey};
use super::value_objects::StockDirection;
use crate::gateway::ReadGateway;

// ============================================================================
// Stock Availability Resolver
// ============================================================================

/// Fetch the stock snapshot a schedule line is confirmed against.
///
/// The plant-level or plant+batch-level record is chosen by whether the line
/// carries a batch. A missing row is `NotFound`; reads are never retried.
pub async fn resolve_stock(
    reader: &dyn ReadGateway,
    line: &ItemScheduleLine,
) -> Result<ProductStock, CancelError> {
    let key = StockKey::for_schedule_line(line).ok_or(CancelError::NotFound("product stock"))?;

    match reader.product_stock(&key).await? {
        Some(stock) => Ok(stock),
        None => {
            tracing::warn!(
                order_id = line.order_id,
                order_item = line.order_item,
                schedule_line = line.schedule_line,
                product = %key.product,
                level = key.level().as_str(),
                "No product stock availability record for schedule line"
            );
            Err(CancelError::NotFound("product stock"))
        }
    }
}

// ============================================================================
// Reservation / Release Calculator
// ============================================================================

/// Result of moving one line's confirmed quantity against its stock snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Record written back to the store
    pub persisted: ProductStock,
    /// Record reported in the response
    pub reported: ProductStock,
    /// Confirmed quantity the schedule line carries afterwards
    pub confirmed_quantity: f32,
}

pub fn reconcile(
    direction: StockDirection,
    snapshot: &ProductStock,
    confirmed_quantity: f32,
) -> Reconciliation {
    match direction {
        StockDirection::Release => release(snapshot, confirmed_quantity),
        StockDirection::Reserve => reserve(snapshot, confirmed_quantity),
    }
}

/// Give the whole confirmed quantity back to stock.
pub fn release(snapshot: &ProductStock, confirmed_quantity: f32) -> Reconciliation {
    let recalculated = (snapshot.available_product_stock + confirmed_quantity).max(0.0);
    let persisted = snapshot.with_available(recalculated);

    Reconciliation {
        reported: persisted.clone(),
        persisted,
        confirmed_quantity: 0.0,
    }
}

/// Deduct the confirmed quantity from stock, flooring at zero.
///
/// The persisted record always reflects the deduction. What is reported
/// differs: the pre-update snapshot with the full confirmed quantity while the
/// snapshot is not below the new value, otherwise the post-update record with
/// the snapshot's availability as the confirmed quantity.
pub fn reserve(snapshot: &ProductStock, confirmed_quantity: f32) -> Reconciliation {
    let available = snapshot.available_product_stock;
    let recalculated = if available >= confirmed_quantity {
        available - confirmed_quantity
    } else {
        0.0
    };
    let persisted = snapshot.with_available(recalculated);

    if available >= recalculated {
        return Reconciliation {
            persisted,
            reported: snapshot.clone(),
            confirmed_quantity,
        };
    }

    // Only reachable with a negative confirmed quantity.
    Reconciliation {
        reported: persisted.clone(),
        persisted,
        confirmed_quantity: available,
    }
}
