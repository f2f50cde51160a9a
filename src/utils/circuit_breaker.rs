use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::gateway::{WriteAck, WriteFailure, WriteFunction};

// ============================================================================
// Write Circuit Breaker
// ============================================================================
//
// Trips on consecutive writer transport failures (send errors, reply
// timeouts). A rejection is a reply from a live writer and counts as the
// writer being reachable. While open, writes fail as transport failures
// without being sent.
//
// States:
// - Closed: writes pass through
// - Open: writes fail fast until the cool-down has elapsed
// - HalfOpen: trial writes decide between Closed and Open
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive transport failures that open the circuit
    pub failure_threshold: u32,
    /// How long the circuit stays open before a trial write
    pub open_for: Duration,
    /// Trial writes that must reach the writer to close the circuit
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_for: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

#[derive(Debug)]
struct Breaker {
    state: CircuitState,
    consecutive_failures: u32,
    trial_successes: u32,
    opened_at: Option<Instant>,
    last_error: Option<String>,
}

impl Breaker {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            trial_successes: 0,
            opened_at: None,
            last_error: None,
        }
    }

    /// Whether a write may be sent at `now`. An open circuit whose cool-down
    /// has elapsed moves to half-open.
    fn admit(&mut self, config: &CircuitBreakerConfig, now: Instant) -> bool {
        if self.state != CircuitState::Open {
            return true;
        }
        match self.opened_at {
            Some(opened_at) if now.duration_since(opened_at) >= config.open_for => {
                tracing::info!("Write circuit half-open, sending trial write");
                self.state = CircuitState::HalfOpen;
                self.trial_successes = 0;
                true
            }
            _ => false,
        }
    }

    fn reached_writer(&mut self, config: &CircuitBreakerConfig) {
        match self.state {
            CircuitState::HalfOpen => {
                self.trial_successes += 1;
                if self.trial_successes >= config.success_threshold {
                    tracing::info!(
                        trial_writes = self.trial_successes,
                        "Write circuit closed, writer reachable again"
                    );
                    *self = Self::new();
                }
            }
            CircuitState::Closed => self.consecutive_failures = 0,
            CircuitState::Open => {}
        }
    }

    fn transport_failed(&mut self, config: &CircuitBreakerConfig, now: Instant, error: &str) {
        self.consecutive_failures += 1;
        self.last_error = Some(error.to_string());

        let trips = match self.state {
            CircuitState::Closed => self.consecutive_failures >= config.failure_threshold,
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };
        if trips {
            tracing::warn!(
                failures = self.consecutive_failures,
                error = %error,
                "Write circuit opened"
            );
            self.state = CircuitState::Open;
            self.opened_at = Some(now);
            self.trial_successes = 0;
        }
    }
}

pub struct CircuitBreaker {
    breaker: Mutex<Breaker>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            breaker: Mutex::new(Breaker::new()),
            config,
        }
    }

    /// Send `write` unless the circuit is open; its outcome is returned as is.
    pub async fn call<F>(&self, function: WriteFunction, write: F) -> Result<WriteAck, WriteFailure>
    where
        F: Future<Output = Result<WriteAck, WriteFailure>>,
    {
        {
            let mut breaker = self.breaker.lock().await;
            if !breaker.admit(&self.config, Instant::now()) {
                return Err(WriteFailure::Transport(format!(
                    "circuit open, {} not sent (last error: {})",
                    function,
                    breaker.last_error.as_deref().unwrap_or("unknown")
                )));
            }
        }

        let outcome = write.await;

        let mut breaker = self.breaker.lock().await;
        match &outcome {
            Err(WriteFailure::Transport(error)) => {
                breaker.transport_failed(&self.config, Instant::now(), error)
            }
            Ok(_) | Err(WriteFailure::Rejected(_)) => breaker.reached_writer(&self.config),
        }

        outcome
    }

    pub async fn get_state(&self) -> CircuitState {
        self.breaker.lock().await.state
    }
}
