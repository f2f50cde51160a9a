use serde::Serialize;

use super::errors::CancelError;
use super::records::{Header, Item, ItemCancellation, ItemScheduleLine, ProductStock};
use super::requests::{CancelsRequest, Message};
use super::stock::{reconcile, resolve_stock, Reconciliation};
use super::value_objects::{CancellationFlag, StockDirection};
use crate::gateway::{HeaderQuery, ReadGateway, WriteFunction, WriteGateway};
use crate::metrics::Metrics;

// ============================================================================
// Cascade Controller
// ============================================================================
//
// One entry point per accepter granularity. Each runs read -> compute ->
// write record by record and stops at the first failure. Writes already
// applied for sibling records are not rolled back.
//
// ============================================================================

pub struct CancelCascade<'a> {
    reader: &'a dyn ReadGateway,
    writer: &'a dyn WriteGateway,
    metrics: &'a Metrics,
    request: &'a CancelsRequest,
}

impl<'a> CancelCascade<'a> {
    pub fn new(
        reader: &'a dyn ReadGateway,
        writer: &'a dyn WriteGateway,
        metrics: &'a Metrics,
        request: &'a CancelsRequest,
    ) -> Self {
        Self {
            reader,
            writer,
            metrics,
            request,
        }
    }

    fn order_id(&self) -> i32 {
        self.request.header.order_id
    }

    /// Header granularity.
    ///
    /// Cancelling cascades to every item and schedule line of the order.
    /// Un-cancelling only touches the header record.
    pub async fn cancel_header(&self) -> Result<Message, CancelError> {
        let requested = self.request.header.is_cancelled;
        if !requested.is_set() {
            return Err(CancelError::InvalidRequest("Header IsCancelled is not set"));
        }

        let mut header = self.read_header().await?;
        header.is_cancelled = requested;
        self.persist(WriteFunction::OrdersHeader, &header).await?;

        if !requested.or_not_cancelled() {
            tracing::info!(
                order_id = self.order_id(),
                "Header cancellation withdrawn, children left untouched"
            );
            return Ok(Message {
                header: Some(header),
                ..Default::default()
            });
        }

        let mut items = self
            .reader
            .items(self.order_id(), self.request.business_partner)
            .await?;
        for item in &mut items {
            item.is_cancelled = requested;
            self.persist(WriteFunction::OrdersItem, &*item).await?;
        }

        let direction = StockDirection::for_cancellation(requested.or_not_cancelled());
        let (schedule_lines, product_stocks) =
            self.reconcile_schedule_lines(direction, requested).await?;

        tracing::info!(
            order_id = self.order_id(),
            items = items.len(),
            schedule_lines = schedule_lines.len(),
            "✅ Header cancellation cascaded"
        );

        Ok(Message {
            header: Some(header),
            items,
            schedule_lines,
            product_stocks,
        })
    }

    /// Item granularity.
    ///
    /// Every schedule line on the order is reconciled, in the direction given
    /// by the order-level flag, and takes the first submitted item's flag.
    /// Withdrawing the first item's cancellation also withdraws the header's.
    pub async fn cancel_items(&self) -> Result<Message, CancelError> {
        let submitted = &self.request.header.items;
        let first = submitted
            .first()
            .ok_or(CancelError::InvalidRequest("No item submitted"))?;

        let direction =
            StockDirection::for_cancellation(self.request.header.is_cancelled.or_not_cancelled());
        let (schedule_lines, product_stocks) = self
            .reconcile_schedule_lines(direction, first.is_cancelled)
            .await?;

        let mut items = Vec::with_capacity(submitted.len());
        for input in submitted {
            let update = ItemCancellation::new(self.order_id(), input.order_item, input.is_cancelled);
            self.persist(WriteFunction::OrdersItem, &update).await?;
            items.push(Item::from(update));
        }

        if first.is_cancelled == CancellationFlag::NotCancelled {
            let mut header = self.read_header().await?;
            header.is_cancelled = CancellationFlag::NotCancelled;
            self.persist(WriteFunction::OrdersHeader, &header).await?;

            tracing::info!(
                order_id = self.order_id(),
                order_item = first.order_item,
                "Item cancellation withdrawn, header cancellation withdrawn too"
            );
        }

        Ok(Message {
            header: None,
            items,
            schedule_lines,
            product_stocks,
        })
    }

    /// Schedule-line granularity: flag-only updates, no stock reconciliation.
    pub async fn cancel_schedule_lines(&self) -> Result<Message, CancelError> {
        let mut schedule_lines = Vec::new();

        for item in &self.request.header.items {
            for input in &item.schedule_lines {
                let line = ItemScheduleLine::cancellation_only(
                    self.order_id(),
                    item.order_item,
                    input.schedule_line,
                    input.is_cancelled,
                );
                self.persist(WriteFunction::OrdersItemScheduleLine, &line).await?;
                schedule_lines.push(line);
            }
        }

        Ok(Message {
            schedule_lines,
            ..Default::default()
        })
    }

    // ------------------------------------------------------------------------
    // Shared steps
    // ------------------------------------------------------------------------

    async fn read_header(&self) -> Result<Header, CancelError> {
        let query = HeaderQuery {
            order_id: self.order_id(),
            business_partner: self.request.business_partner,
            header_delivery_status: self.request.header.header_delivery_status.clone(),
        };

        match self.reader.header(&query).await? {
            Some(header) => Ok(header),
            None => {
                tracing::warn!(
                    order_id = query.order_id,
                    business_partner = query.business_partner,
                    "Order header not found"
                );
                Err(CancelError::NotFound("header"))
            }
        }
    }

    /// Reconcile and persist each schedule line of the order exactly once.
    async fn reconcile_schedule_lines(
        &self,
        direction: StockDirection,
        line_flag: CancellationFlag,
    ) -> Result<(Vec<ItemScheduleLine>, Vec<ProductStock>), CancelError> {
        let mut lines = self
            .reader
            .schedule_lines(self.order_id(), self.request.business_partner)
            .await?;
        let mut product_stocks = Vec::with_capacity(lines.len());

        for line in &mut lines {
            let reconciliation = self.reconcile_stock(direction, line).await?;

            line.confirmed_order_quantity_by_pdt_avail_check_in_base_unit =
                Some(reconciliation.confirmed_quantity);
            line.is_cancelled = line_flag;
            self.persist(WriteFunction::OrdersItemScheduleLine, &*line).await?;

            product_stocks.push(reconciliation.reported);
        }

        Ok((lines, product_stocks))
    }

    async fn reconcile_stock(
        &self,
        direction: StockDirection,
        line: &ItemScheduleLine,
    ) -> Result<Reconciliation, CancelError> {
        let snapshot = resolve_stock(self.reader, line).await?;
        let level = snapshot.level();
        let reconciliation = reconcile(direction, &snapshot, line.confirmed_quantity());

        self.persist(level.write_function(), &reconciliation.persisted)
            .await?;
        self.metrics.record_stock_reconciliation(direction, level);

        tracing::debug!(
            order_id = line.order_id,
            order_item = line.order_item,
            schedule_line = line.schedule_line,
            direction = direction.as_str(),
            level = level.as_str(),
            before = snapshot.available_product_stock,
            after = reconciliation.persisted.available_product_stock,
            "Reconciled product stock"
        );

        Ok(reconciliation)
    }

    async fn persist<T: Serialize>(
        &self,
        function: WriteFunction,
        record: &T,
    ) -> Result<(), CancelError> {
        let message = serde_json::to_value(record)?;

        match self
            .writer
            .apply(&self.request.runtime_session_id, function, message)
            .await
        {
            Ok(_) => {
                tracing::debug!(order_id = self.order_id(), function = %function, "Record updated");
                Ok(())
            }
            Err(failure) => {
                tracing::error!(
                    order_id = self.order_id(),
                    function = %function,
                    session_id = %self.request.runtime_session_id,
                    error = %failure,
                    "Record update failed"
                );
                Err(CancelError::Write { function, failure })
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cancels::testing::*;
    use crate::domain::cancels::Accepter;
    use crate::gateway::WriteFailure;

    fn single_line_order() -> InMemoryReadGateway {
        InMemoryReadGateway::default()
            .with_header(header())
            .with_item(item(1))
            .with_schedule_line(schedule_line(1, 1, 4.0))
            .with_stock(plant_stock(10.0))
    }

    #[tokio::test]
    async fn test_header_cancel_releases_stock() {
        let reader = single_line_order();
        let writer = RecordingWriteGateway::default();
        let metrics = Metrics::new().unwrap();
        let request = request(vec![Accepter::Header], CancellationFlag::Cancelled);

        let message = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_header()
            .await
            .unwrap();

        let functions: Vec<WriteFunction> = writer.writes().iter().map(|w| w.function).collect();
        assert_eq!(
            functions,
            vec![
                WriteFunction::OrdersHeader,
                WriteFunction::OrdersItem,
                WriteFunction::ProductStockAvailability,
                WriteFunction::OrdersItemScheduleLine,
            ]
        );

        let stock = &writer.messages_for(WriteFunction::ProductStockAvailability)[0];
        assert_eq!(stock["AvailableProductStock"], 14.0);

        let line = &writer.messages_for(WriteFunction::OrdersItemScheduleLine)[0];
        assert_eq!(line["ConfirmedOrderQuantityByPDTAvailCheckInBaseUnit"], 0.0);
        assert_eq!(line["IsCancelled"], true);

        assert_eq!(message.header.unwrap().is_cancelled, CancellationFlag::Cancelled);
        assert_eq!(message.items[0].is_cancelled, CancellationFlag::Cancelled);
        assert_eq!(message.schedule_lines[0].confirmed_quantity(), 0.0);
        assert_eq!(message.product_stocks[0].available_product_stock, 14.0);
        assert!(writer.writes().iter().all(|w| w.session_id == SESSION_ID));
    }

    #[tokio::test]
    async fn test_header_cancel_touches_every_item_and_line() {
        let reader = InMemoryReadGateway::default()
            .with_header(header())
            .with_item(item(1))
            .with_item(item(2))
            .with_schedule_line(schedule_line(1, 1, 1.0))
            .with_schedule_line(schedule_line(1, 2, 2.0))
            .with_schedule_line(schedule_line(2, 1, 3.0))
            .with_stock(plant_stock(10.0));
        let writer = RecordingWriteGateway::default();
        let metrics = Metrics::new().unwrap();
        let request = request(vec![Accepter::Header], CancellationFlag::Cancelled);

        let message = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_header()
            .await
            .unwrap();

        assert!(message.header.is_some());
        assert_eq!(message.items.len(), 2);
        assert!(message
            .items
            .iter()
            .all(|i| i.is_cancelled == CancellationFlag::Cancelled));
        assert_eq!(message.schedule_lines.len(), 3);
        assert_eq!(message.product_stocks.len(), 3);
        assert_eq!(writer.count(WriteFunction::OrdersHeader), 1);
        assert_eq!(writer.count(WriteFunction::OrdersItem), 2);
        assert_eq!(writer.count(WriteFunction::ProductStockAvailability), 3);
        assert_eq!(writer.count(WriteFunction::OrdersItemScheduleLine), 3);
    }

    #[tokio::test]
    async fn test_header_uncancel_leaves_children_untouched() {
        let reader = single_line_order();
        let writer = RecordingWriteGateway::default();
        let metrics = Metrics::new().unwrap();
        let request = request(vec![Accepter::Header], CancellationFlag::NotCancelled);

        let message = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_header()
            .await
            .unwrap();

        assert_eq!(message.header.unwrap().is_cancelled, CancellationFlag::NotCancelled);
        assert!(message.items.is_empty());
        assert!(message.schedule_lines.is_empty());
        assert!(message.product_stocks.is_empty());
        assert_eq!(writer.writes().len(), 1);
        assert_eq!(writer.messages_for(WriteFunction::OrdersHeader)[0]["IsCancelled"], false);
    }

    #[tokio::test]
    async fn test_header_not_found_writes_nothing() {
        let reader = InMemoryReadGateway::default();
        let writer = RecordingWriteGateway::default();
        let metrics = Metrics::new().unwrap();
        let request = request(vec![Accepter::Header], CancellationFlag::Cancelled);

        let result = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_header()
            .await;

        assert!(matches!(result, Err(CancelError::NotFound("header"))));
        assert!(writer.writes().is_empty());
    }

    #[tokio::test]
    async fn test_header_branch_requires_a_flag() {
        let reader = single_line_order();
        let writer = RecordingWriteGateway::default();
        let metrics = Metrics::new().unwrap();
        let request = request(vec![Accepter::Header], CancellationFlag::Unset);

        let result = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_header()
            .await;

        assert!(matches!(result, Err(CancelError::InvalidRequest(_))));
        assert!(writer.writes().is_empty());
    }

    #[tokio::test]
    async fn test_schedule_line_rejection_stops_the_branch() {
        let reader = InMemoryReadGateway::default()
            .with_header(header())
            .with_item(item(1))
            .with_schedule_line(schedule_line(1, 1, 1.0))
            .with_schedule_line(schedule_line(1, 2, 2.0))
            .with_stock(plant_stock(10.0));
        let writer =
            RecordingWriteGateway::default().reject_nth(WriteFunction::OrdersItemScheduleLine, 1);
        let metrics = Metrics::new().unwrap();
        let request = request(vec![Accepter::Header], CancellationFlag::Cancelled);

        let error = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_header()
            .await
            .unwrap_err();

        assert_eq!(
            error.update_failure(),
            Some("Order Item Schedule Line Data cannot cancel")
        );
        // Earlier sibling writes stay applied, the second line is never reached
        assert_eq!(writer.count(WriteFunction::OrdersHeader), 1);
        assert_eq!(writer.count(WriteFunction::OrdersItem), 1);
        assert_eq!(writer.count(WriteFunction::ProductStockAvailability), 1);
        assert_eq!(writer.count(WriteFunction::OrdersItemScheduleLine), 1);
    }

    #[tokio::test]
    async fn test_batch_line_reconciles_batch_record() {
        let mut line = schedule_line(1, 1, 2.0);
        line.stock_confirmation_plant_batch = Some("B-7".to_string());
        let mut batched = plant_stock(5.0);
        batched.batch = Some("B-7".to_string());

        let reader = InMemoryReadGateway::default()
            .with_header(header())
            .with_item(item(1))
            .with_schedule_line(line)
            .with_stock(plant_stock(10.0))
            .with_stock(batched);
        let writer = RecordingWriteGateway::default();
        let metrics = Metrics::new().unwrap();
        let request = request(vec![Accepter::Header], CancellationFlag::Cancelled);

        let message = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_header()
            .await
            .unwrap();

        assert_eq!(writer.count(WriteFunction::ProductStockAvailability), 0);
        let stock = &writer.messages_for(WriteFunction::ProductStockAvailabilityByBatch)[0];
        assert_eq!(stock["Batch"], "B-7");
        assert_eq!(stock["AvailableProductStock"], 7.0);
        assert_eq!(message.product_stocks[0].batch.as_deref(), Some("B-7"));
    }

    #[tokio::test]
    async fn test_missing_stock_stops_before_line_write() {
        let reader = InMemoryReadGateway::default()
            .with_header(header())
            .with_item(item(1))
            .with_schedule_line(schedule_line(1, 1, 4.0));
        let writer = RecordingWriteGateway::default();
        let metrics = Metrics::new().unwrap();
        let request = request(vec![Accepter::Header], CancellationFlag::Cancelled);

        let error = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_header()
            .await
            .unwrap_err();

        assert!(matches!(error, CancelError::NotFound("product stock")));
        assert_eq!(error.update_failure(), None);
        assert_eq!(writer.count(WriteFunction::OrdersItemScheduleLine), 0);
    }

    #[tokio::test]
    async fn test_item_uncancel_reserves_and_uncancels_header() {
        let reader = single_line_order();
        let writer = RecordingWriteGateway::default();
        let metrics = Metrics::new().unwrap();
        let mut request = request(vec![Accepter::Item], CancellationFlag::Unset);
        request.header.items = vec![item_input(1, CancellationFlag::NotCancelled)];

        let message = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_items()
            .await
            .unwrap();

        let headers = writer.messages_for(WriteFunction::OrdersHeader);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0]["IsCancelled"], false);

        // Unset order-level flag reserves: persisted deduction, reported snapshot
        let stock = &writer.messages_for(WriteFunction::ProductStockAvailability)[0];
        assert_eq!(stock["AvailableProductStock"], 6.0);
        assert_eq!(message.product_stocks[0].available_product_stock, 10.0);
        assert_eq!(message.schedule_lines[0].confirmed_quantity(), 4.0);
        assert_eq!(message.schedule_lines[0].is_cancelled, CancellationFlag::NotCancelled);
        assert!(message.header.is_none());
    }

    #[tokio::test]
    async fn test_item_cancel_releases_without_touching_header() {
        let reader = single_line_order().with_item(item(2));
        let writer = RecordingWriteGateway::default();
        let metrics = Metrics::new().unwrap();
        let mut request = request(vec![Accepter::Item], CancellationFlag::Cancelled);
        request.header.items = vec![
            item_input(1, CancellationFlag::Cancelled),
            item_input(2, CancellationFlag::Cancelled),
        ];

        let message = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_items()
            .await
            .unwrap();

        assert_eq!(writer.count(WriteFunction::OrdersHeader), 0);
        assert_eq!(message.items.len(), 2);

        let items = writer.messages_for(WriteFunction::OrdersItem);
        assert_eq!(
            items[1],
            serde_json::json!({
                "OrderID": ORDER_ID,
                "OrderItem": 2,
                "ItemDeliveryStatus": null,
                "IsCancelled": true,
            })
        );

        let stock = &writer.messages_for(WriteFunction::ProductStockAvailability)[0];
        assert_eq!(stock["AvailableProductStock"], 14.0);
        assert_eq!(message.schedule_lines[0].is_cancelled, CancellationFlag::Cancelled);
    }

    #[tokio::test]
    async fn test_item_branch_without_items_is_rejected() {
        let reader = single_line_order();
        let writer = RecordingWriteGateway::default();
        let metrics = Metrics::new().unwrap();
        let request = request(vec![Accepter::Item], CancellationFlag::Cancelled);

        let result = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_items()
            .await;

        assert!(matches!(result, Err(CancelError::InvalidRequest(_))));
        assert!(writer.writes().is_empty());
    }

    #[tokio::test]
    async fn test_stock_transport_failure_names_stock_update() {
        let reader = single_line_order();
        let writer = RecordingWriteGateway::default()
            .fail_transport_nth(WriteFunction::ProductStockAvailability, 1);
        let metrics = Metrics::new().unwrap();
        let mut request = request(vec![Accepter::Item], CancellationFlag::Cancelled);
        request.header.items = vec![item_input(1, CancellationFlag::Cancelled)];

        let error = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_items()
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            CancelError::Write {
                failure: WriteFailure::Transport(_),
                ..
            }
        ));
        assert_eq!(
            error.update_failure(),
            Some("Product Stock Availability Data cannot update")
        );
        assert_eq!(writer.count(WriteFunction::OrdersItemScheduleLine), 0);
        assert_eq!(writer.count(WriteFunction::OrdersItem), 0);
    }

    #[tokio::test]
    async fn test_schedule_branch_writes_flag_only_records() {
        let reader = InMemoryReadGateway::default();
        let writer = RecordingWriteGateway::default();
        let metrics = Metrics::new().unwrap();
        let mut request = request(vec![Accepter::ItemScheduleLine], CancellationFlag::Unset);
        let mut first = item_input(1, CancellationFlag::Unset);
        first.schedule_lines = vec![
            schedule_line_input(1, CancellationFlag::Cancelled),
            schedule_line_input(2, CancellationFlag::NotCancelled),
        ];
        let mut second = item_input(2, CancellationFlag::Unset);
        second.schedule_lines = vec![schedule_line_input(1, CancellationFlag::Cancelled)];
        request.header.items = vec![first, second];

        let message = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_schedule_lines()
            .await
            .unwrap();

        assert_eq!(message.schedule_lines.len(), 3);
        assert!(message.product_stocks.is_empty());
        assert_eq!(writer.writes().len(), 3);
        assert_eq!(
            writer.messages_for(WriteFunction::OrdersItemScheduleLine)[1],
            serde_json::json!({
                "OrderID": ORDER_ID,
                "OrderItem": 1,
                "ScheduleLine": 2,
                "IsCancelled": false,
            })
        );
    }

    #[tokio::test]
    async fn test_item_uncancel_without_header_fails_after_item_writes() {
        let reader = InMemoryReadGateway::default().with_item(item(1));
        let writer = RecordingWriteGateway::default();
        let metrics = Metrics::new().unwrap();
        let mut request = request(vec![Accepter::Item], CancellationFlag::Unset);
        request.header.items = vec![item_input(1, CancellationFlag::NotCancelled)];

        let error = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_items()
            .await
            .unwrap_err();

        assert!(matches!(error, CancelError::NotFound("header")));
        assert_eq!(error.update_failure(), None);
        assert_eq!(writer.count(WriteFunction::OrdersItem), 1);
        assert_eq!(writer.count(WriteFunction::OrdersHeader), 0);
    }

    #[tokio::test]
    async fn test_item_uncancel_header_rejection_names_header() {
        let reader = single_line_order();
        let writer = RecordingWriteGateway::default().reject_nth(WriteFunction::OrdersHeader, 1);
        let metrics = Metrics::new().unwrap();
        let mut request = request(vec![Accepter::Item], CancellationFlag::Unset);
        request.header.items = vec![item_input(1, CancellationFlag::NotCancelled)];

        let error = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_items()
            .await
            .unwrap_err();

        assert_eq!(error.update_failure(), Some("Header Data cannot cancel"));
        assert_eq!(writer.count(WriteFunction::ProductStockAvailability), 1);
        assert_eq!(writer.count(WriteFunction::OrdersItemScheduleLine), 1);
        assert_eq!(writer.count(WriteFunction::OrdersItem), 1);
        assert_eq!(writer.count(WriteFunction::OrdersHeader), 1);
    }

    #[tokio::test]
    async fn test_header_cancel_item_rejection_stops_before_stock() {
        let reader = single_line_order().with_item(item(2));
        let writer = RecordingWriteGateway::default().reject_nth(WriteFunction::OrdersItem, 1);
        let metrics = Metrics::new().unwrap();
        let request = request(vec![Accepter::Header], CancellationFlag::Cancelled);

        let error = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_header()
            .await
            .unwrap_err();

        assert_eq!(error.update_failure(), Some("Order Item Data cannot cancel"));
        assert_eq!(writer.count(WriteFunction::OrdersHeader), 1);
        // Second item is never attempted
        assert_eq!(writer.count(WriteFunction::OrdersItem), 1);
        assert_eq!(writer.count(WriteFunction::ProductStockAvailability), 0);
        assert_eq!(writer.count(WriteFunction::OrdersItemScheduleLine), 0);
    }

    #[tokio::test]
    async fn test_seller_may_cancel_the_order() {
        let reader = single_line_order();
        let writer = RecordingWriteGateway::default();
        let metrics = Metrics::new().unwrap();
        let mut request = request(vec![Accepter::Header], CancellationFlag::Cancelled);
        request.business_partner = SELLER;

        let message = CancelCascade::new(&reader, &writer, &metrics, &request)
            .cancel_header()
            .await
            .unwrap();

        assert_eq!(message.items.len(), 1);
        assert_eq!(writer.count(WriteFunction::OrdersHeader), 1);
        assert_eq!(writer.count(WriteFunction::OrdersItemScheduleLine), 1);
    }

    #[tokio::test]
    async fn test_unrelated_partner_cannot_reach_the_order() {
        let reader = single_line_order();
        let metrics = Metrics::new().unwrap();
        let mut header_request = request(vec![Accepter::Header], CancellationFlag::Cancelled);
        header_request.business_partner = 999;

        let writer = RecordingWriteGateway::default();
        let result = CancelCascade::new(&reader, &writer, &metrics, &header_request)
            .cancel_header()
            .await;

        assert!(matches!(result, Err(CancelError::NotFound("header"))));
        assert!(writer.writes().is_empty());

        let mut item_request = header_request.clone();
        item_request.accepter = vec![Accepter::Item];
        item_request.header.items = vec![item_input(1, CancellationFlag::Cancelled)];

        let writer = RecordingWriteGateway::default();
        let message = CancelCascade::new(&reader, &writer, &metrics, &item_request)
            .cancel_items()
            .await
            .unwrap();

        // Schedule lines of an order the partner is not party to stay untouched
        assert!(message.schedule_lines.is_empty());
        assert_eq!(writer.count(WriteFunction::ProductStockAvailability), 0);
        assert_eq!(writer.count(WriteFunction::OrdersItemScheduleLine), 0);
    }
}
