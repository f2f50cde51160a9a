// Private module declaration
mod server;

use prometheus::{Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry};

use crate::domain::cancels::{StockDirection, StockLevel, CANCELS_API_TYPE};
use crate::gateway::WriteFunction;
use crate::utils::CircuitState;

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Cancellation requests (throughput, latency)
// - Cascade branch outcomes per accepter
// - Write gateway round trips per function
// - Stock reconciliations per direction and stock level
// - Write gateway circuit breaker state
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the service
pub struct Metrics {
    registry: Registry,

    // Request Metrics
    pub requests_total: IntCounterVec,
    pub request_duration: Histogram,

    // Cascade Metrics
    pub branch_outcomes: IntCounterVec,
    pub stock_reconciliations: IntCounterVec,

    // Write Gateway Metrics
    pub writes_total: IntCounterVec,
    pub circuit_breaker_state: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("cancels_requests_total", "Total cancellation requests processed"),
            &["api_type", "outcome"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_duration = Histogram::with_opts(
            HistogramOpts::new("cancels_request_duration_seconds", "Cancellation request duration")
                .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        let branch_outcomes = IntCounterVec::new(
            Opts::new("cancels_branch_outcomes_total", "Cascade branch outcomes by accepter"),
            &["accepter", "outcome"],
        )?;
        registry.register(Box::new(branch_outcomes.clone()))?;

        let stock_reconciliations = IntCounterVec::new(
            Opts::new("cancels_stock_reconciliations_total", "Product stock reconciliations"),
            &["direction", "level"],
        )?;
        registry.register(Box::new(stock_reconciliations.clone()))?;

        let writes_total = IntCounterVec::new(
            Opts::new("cancels_writes_total", "Write gateway round trips by function"),
            &["function", "outcome"],
        )?;
        registry.register(Box::new(writes_total.clone()))?;

        let circuit_breaker_state = IntGauge::new(
            "cancels_write_circuit_breaker_state",
            "Write gateway circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
            branch_outcomes,
            stock_reconciliations,
            writes_total,
            circuit_breaker_state,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Any api type other than the served one is counted as `unknown`.
    pub fn record_request(&self, api_type: &str, success: bool) {
        let api_type = if api_type == CANCELS_API_TYPE {
            CANCELS_API_TYPE
        } else {
            "unknown"
        };
        let outcome = if success { "success" } else { "failure" };
        self.requests_total.with_label_values(&[api_type, outcome]).inc();
    }

    pub fn observe_request_duration(&self, duration_secs: f64) {
        self.request_duration.observe(duration_secs);
    }

    pub fn record_branch(&self, accepter: &str, outcome: &str) {
        self.branch_outcomes.with_label_values(&[accepter, outcome]).inc();
    }

    pub fn record_stock_reconciliation(&self, direction: StockDirection, level: StockLevel) {
        self.stock_reconciliations
            .with_label_values(&[direction.as_str(), level.as_str()])
            .inc();
    }

    pub fn record_write(&self, function: WriteFunction, outcome: &str) {
        self.writes_total
            .with_label_values(&[function.as_str(), outcome])
            .inc();
    }

    pub fn update_circuit_breaker_state(&self, state: CircuitState) {
        let value = match state {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        };
        self.circuit_breaker_state.set(value);
    }
}
