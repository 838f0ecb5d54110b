//! Circuit breaker: a failure-rate gate around a fallible async callable.

use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Mutex;

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive expected failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long the circuit stays open before permitting a trial call.
    pub timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation, calls pass through.
    Closed,
    /// Calls are rejected until the timeout elapses.
    Open,
    /// A trial call is permitted to probe recovery.
    HalfOpen,
}

#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    /// Call rejected: the circuit is open.
    #[error("circuit breaker is open")]
    Open,
    /// The wrapped operation failed.
    #[error("operation failed: {0}")]
    Inner(E),
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// Failure-counting gate around an async operation.
///
/// Only errors the caller's classifier marks as expected count toward the
/// failure threshold; anything else passes through without touching state.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
            }),
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.state.lock().await.state
    }

    /// Run `operation` under the breaker.
    ///
    /// `is_expected` classifies which errors count as failures; unexpected
    /// errors propagate transparently and leave the breaker untouched.
    pub async fn call<F, Fut, T, E>(
        &self,
        operation: F,
        is_expected: impl Fn(&E) -> bool,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        {
            let mut state = self.state.lock().await;
            if state.state == CircuitState::Open {
                let timed_out = state
                    .last_failure
                    .map(|t| t.elapsed() >= self.config.timeout)
                    .unwrap_or(true);
                if timed_out {
                    tracing::info!("circuit breaker entering HALF_OPEN");
                    state.state = CircuitState::HalfOpen;
                } else {
                    return Err(CircuitBreakerError::Open);
                }
            }
        }

        match operation().await {
            Ok(value) => {
                self.on_success().await;
                Ok(value)
            }
            Err(e) if is_expected(&e) => {
                self.on_failure().await;
                Err(CircuitBreakerError::Inner(e))
            }
            Err(e) => Err(CircuitBreakerError::Inner(e)),
        }
    }

    /// Manually reset to closed.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.state = CircuitState::Closed;
        state.failure_count = 0;
        state.last_failure = None;
        tracing::info!("circuit breaker manually reset to CLOSED");
    }

    async fn on_success(&self) {
        let mut state = self.state.lock().await;
        state.failure_count = 0;
        if state.state == CircuitState::HalfOpen {
            tracing::info!("circuit breaker CLOSED after successful trial");
            state.state = CircuitState::Closed;
            state.last_failure = None;
        }
    }

    async fn on_failure(&self) {
        let mut state = self.state.lock().await;
        state.failure_count += 1;
        state.last_failure = Some(Instant::now());

        match state.state {
            CircuitState::HalfOpen => {
                tracing::warn!("circuit breaker re-OPENED after failed trial");
                state.state = CircuitState::Open;
            }
            CircuitState::Closed if state.failure_count >= self.config.failure_threshold => {
                tracing::warn!(
                    failures = state.failure_count,
                    "circuit breaker OPENED"
                );
                state.state = CircuitState::Open;
            }
            _ => {}
        }
    }
}
