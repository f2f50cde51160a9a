use std::sync::Arc;
use std::time::Instant;

use super::cascade::CancelCascade;
use super::requests::{CancelsRequest, CancelsResponse, Message, CANCELS_API_TYPE};
use super::value_objects::Accepter;
use crate::gateway::{ReadGateway, WriteGateway};
use crate::metrics::Metrics;

// ============================================================================
// Cancels Caller - runs the requested branches and aggregates their results
// ============================================================================
//
// Orchestrates: Request -> Cascade branch per accepter -> Response
//
// Branches run sequentially in the order they were requested. A failed
// branch contributes nothing to the response; the remaining branches still
// run. The first write failure sets the update-failed flag and reason.
//
// ============================================================================

pub struct CancelsCaller {
    reader: Arc<dyn ReadGateway>,
    writer: Arc<dyn WriteGateway>,
    metrics: Arc<Metrics>,
}

impl CancelsCaller {
    pub fn new(
        reader: Arc<dyn ReadGateway>,
        writer: Arc<dyn WriteGateway>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            reader,
            writer,
            metrics,
        }
    }

    pub async fn process(&self, request: &CancelsRequest) -> CancelsResponse {
        let started = Instant::now();
        let mut response = CancelsResponse::for_request(request);

        if request.api_type != CANCELS_API_TYPE {
            tracing::error!(
                api_type = %request.api_type,
                session_id = %request.runtime_session_id,
                "Unknown api type"
            );
            self.metrics.record_request(&request.api_type, false);
            response.api_processing_result = Some(false);
            response.api_processing_error = format!("unknown api type {}", request.api_type);
            return response;
        }

        tracing::info!(
            order_id = request.header.order_id,
            session_id = %request.runtime_session_id,
            accepter = ?request.accepter,
            "Processing cancellation request"
        );

        let cascade = CancelCascade::new(
            self.reader.as_ref(),
            self.writer.as_ref(),
            self.metrics.as_ref(),
            request,
        );
        let mut message = Message::default();

        for accepter in &request.accepter {
            let result = match accepter {
                Accepter::Header => cascade.cancel_header().await,
                Accepter::Item => cascade.cancel_items().await,
                Accepter::ItemScheduleLine => cascade.cancel_schedule_lines().await,
                Accepter::Unknown => {
                    tracing::warn!(
                        order_id = request.header.order_id,
                        "Skipping unknown accepter"
                    );
                    continue;
                }
            };

            match result {
                Ok(branch) => {
                    self.metrics.record_branch(accepter.as_str(), "success");
                    merge(&mut message, branch);
                }
                Err(error) => {
                    self.metrics.record_branch(accepter.as_str(), error.kind());
                    tracing::warn!(
                        order_id = request.header.order_id,
                        accepter = accepter.as_str(),
                        error = %error,
                        "Cancellation branch aborted"
                    );
                    if let Some(reason) = error.update_failure() {
                        response.mark_update_failed(reason);
                    }
                }
            }
        }

        let succeeded = response.sql_update_result != Some(false);
        if succeeded {
            response.sql_update_result = Some(true);
        }
        response.api_processing_result = Some(true);
        response.message = message;

        self.metrics.record_request(&request.api_type, succeeded);
        self.metrics
            .observe_request_duration(started.elapsed().as_secs_f64());

        response
    }
}

fn merge(into: &mut Message, branch: Message) {
    if branch.header.is_some() {
        into.header = branch.header;
    }
    into.items.extend(branch.items);
    into.schedule_lines.extend(branch.schedule_lines);
    into.product_stocks.extend(branch.product_stocks);
}
