// src/tools/async_support.rs
//! Timeout and bounded polling helpers for chain calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

/// Timeout configuration
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub duration: Duration,
    pub operation_name: String,
}

impl TimeoutConfig {
    pub fn new(duration: Duration, operation_name: impl Into<String>) -> Self {
        Self { duration, operation_name: operation_name.into() }
    }
}

/// Run `future` under `config`, mapping expiry through `on_timeout`.
pub async fn execute_with_timeout<F, T, E>(
    future: F,
    config: &TimeoutConfig,
    on_timeout: impl FnOnce(Duration) -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match timeout(config.duration, future).await {
        Ok(result) => result,
        Err(_) => {
            debug!("Operation '{}' timed out after {:?}", config.operation_name, config.duration);
            Err(on_timeout(config.duration))
        }
    }
}

/// Fixed-interval polling budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready { value: T, attempts: u32 },
    Exhausted { attempts: u32 },
}

/// Call `probe(attempt)` until it yields a value or the budget runs out.
///
/// Sleeps `interval` between attempts, never after the last one.
pub async fn poll_until<F, Fut, T>(config: PollConfig, mut probe: F) -> PollOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=config.max_attempts {
        if let Some(value) = probe(attempt).await {
            return PollOutcome::Ready { value, attempts: attempt };
        }
        if attempt < config.max_attempts {
            tokio::time::sleep(config.interval).await;
        }
    }
    PollOutcome::Exhausted { attempts: config.max_attempts }
}
