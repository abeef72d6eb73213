//! Endpoint resilience wrapper with retries and circuit breaking.

use super::{DialogueEndpoint, DialogueRequest, DialogueResponse};
use crate::config::EndpointConfig;
use crate::{Error, Result};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Resilience configuration for endpoint calls.
#[derive(Debug, Clone)]
pub struct EndpointResilienceConfig {
    /// Maximum number of retries for retryable failures.
    pub max_retries: u32,
    /// Backoff between retries in milliseconds.
    pub retry_backoff_ms: u64,
    /// Consecutive failures before opening the circuit.
    pub breaker_failure_threshold: u32,
    /// How long to keep the circuit open before half-open.
    pub breaker_reset_timeout_ms: u64,
    /// Maximum trial calls while half-open.
    pub breaker_half_open_max_calls: u32,
}

impl Default for EndpointResilienceConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_backoff_ms: 100,
            breaker_failure_threshold: 3,
            breaker_reset_timeout_ms: 30_000,
            breaker_half_open_max_calls: 1,
        }
    }
}

impl EndpointResilienceConfig {
    /// Loads resilience configuration from endpoint settings.
    #[must_use]
    pub fn from_config(config: &EndpointConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            breaker_failure_threshold: config.breaker_failure_threshold.max(1),
            breaker_reset_timeout_ms: config.breaker_reset_ms,
            breaker_half_open_max_calls: config.breaker_half_open_max_calls.max(1),
        }
    }
}

/// Circuit breaker state machine.
#[derive(Debug)]
enum BreakerState {
    Closed { failures: u32 },
    Open { opened_at: Instant },
    HalfOpen { attempts: u32 },
}

#[derive(Debug)]
struct CircuitBreaker {
    state: BreakerState,
    failure_threshold: u32,
    reset_timeout: Duration,
    half_open_max_calls: u32,
}

impl CircuitBreaker {
    fn new(config: &EndpointResilienceConfig) -> Self {
        Self {
            state: BreakerState::Closed { failures: 0 },
            failure_threshold: config.breaker_failure_threshold.max(1),
            reset_timeout: Duration::from_millis(config.breaker_reset_timeout_ms),
            half_open_max_calls: config.breaker_half_open_max_calls.max(1),
        }
    }

    fn allow(&mut self) -> bool {
        match self.state {
            BreakerState::Closed { .. } => true,
            BreakerState::Open { opened_at } => {
                if opened_at.elapsed() >= self.reset_timeout {
                    self.state = BreakerState::HalfOpen { attempts: 1 };
                    true
                } else {
                    false
                }
            },
            BreakerState::HalfOpen { ref mut attempts } => {
                if *attempts >= self.half_open_max_calls {
                    false
                } else {
                    *attempts += 1;
                    true
                }
            },
        }
    }

    const fn on_success(&mut self) {
        self.state = BreakerState::Closed { failures: 0 };
    }

    /// Records a failure; returns true if this trips the breaker open.
    fn on_failure(&mut self) -> bool {
        match self.state {
            BreakerState::Closed { ref mut failures } => {
                *failures += 1;
                if *failures >= self.failure_threshold {
                    self.state = BreakerState::Open {
                        opened_at: Instant::now(),
                    };
                    return true;
                }
            },
            BreakerState::HalfOpen { .. } => {
                self.state = BreakerState::Open {
                    opened_at: Instant::now(),
                };
                return true;
            },
            BreakerState::Open { .. } => {},
        }
        false
    }

    const fn is_open(&self) -> bool {
        matches!(self.state, BreakerState::Open { .. })
    }
}

/// Endpoint wrapper with bounded retries and a circuit breaker.
///
/// Only transport errors count as failures. A well-formed response with
/// `success = false` is passed through untouched.
pub struct ResilientEndpoint<E: DialogueEndpoint> {
    inner: E,
    config: EndpointResilienceConfig,
    breaker: Mutex<CircuitBreaker>,
}

impl<E: DialogueEndpoint> ResilientEndpoint<E> {
    /// Creates a new resilient endpoint wrapper.
    #[must_use]
    pub fn new(inner: E, config: EndpointResilienceConfig) -> Self {
        let breaker = CircuitBreaker::new(&config);
        Self {
            inner,
            config,
            breaker: Mutex::new(breaker),
        }
    }

    /// Returns the wrapped endpoint.
    #[must_use]
    pub const fn inner(&self) -> &E {
        &self.inner
    }

    /// Returns true while the circuit rejects calls.
    #[must_use]
    pub fn is_circuit_open(&self) -> bool {
        self.breaker
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_open()
    }

    fn execute(&self, request: &DialogueRequest) -> Result<DialogueResponse> {
        let endpoint: &'static str = self.inner.name();
        let span = tracing::info_span!(
            "dialogue.request",
            endpoint = endpoint,
            status = tracing::field::Empty,
            error = tracing::field::Empty
        );
        let _enter = span.enter();

        let allowed = self
            .breaker
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .allow();
        if !allowed {
            span.record("status", "circuit_open");
            record_request(endpoint, "circuit_open");
            return Err(Error::OperationFailed {
                operation: "dialogue_request".to_string(),
                cause: "circuit breaker open".to_string(),
            });
        }

        let max_attempts = self.config.max_retries + 1;
        let mut attempts = 0;
        loop {
            attempts += 1;
            let err = match self.inner.send(request) {
                Ok(response) => {
                    self.breaker
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner)
                        .on_success();
                    span.record("status", "success");
                    record_request(endpoint, "success");
                    return Ok(response);
                },
                Err(err) => err,
            };

            let retryable = is_retryable(&err);
            let status = if is_timeout_error(&err) {
                "timeout"
            } else {
                "error"
            };
            span.record("status", status);
            span.record("error", tracing::field::display(&err));
            record_request(endpoint, status);

            let tripped = self
                .breaker
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .on_failure();
            if tripped {
                tracing::warn!("Dialogue circuit breaker opened for endpoint={endpoint}");
                return Err(err);
            }

            if !retryable || attempts >= max_attempts {
                return Err(err);
            }

            tracing::warn!(
                attempt = attempts,
                "Retrying dialogue request endpoint={endpoint}: {err}"
            );
            if self.config.retry_backoff_ms > 0 {
                std::thread::sleep(Duration::from_millis(self.config.retry_backoff_ms));
            }
        }
    }
}

impl<E: DialogueEndpoint> DialogueEndpoint for ResilientEndpoint<E> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn send(&self, request: &DialogueRequest) -> Result<DialogueResponse> {
        self.execute(request)
    }
}

fn record_request(endpoint: &'static str, status: &'static str) {
    metrics::counter!(
        "fragmind_endpoint_requests_total",
        "endpoint" => endpoint,
        "status" => status
    )
    .increment(1);
}

fn is_timeout_error(err: &Error) -> bool {
    match err {
        Error::OperationFailed { cause, .. } => {
            let lower = cause.to_lowercase();
            lower.contains("timeout")
                || lower.contains("timed out")
                || lower.contains("deadline")
                || lower.contains("elapsed")
        },
        _ => false,
    }
}

fn is_retryable(err: &Error) -> bool {
    if is_timeout_error(err) {
        return true;
    }
    match err {
        Error::OperationFailed { cause, .. } => {
            let lower = cause.to_lowercase();
            lower.contains("connection refused")
                || lower.contains("connection reset")
                || lower.contains("error sending request")
        },
        _ => false,
    }
}
