//! Best-effort result handling
//!
//! Some failures must never reach the caller (the pending-transfer ledger is a
//! convenience record). Those call sites go through `unwrap_or_log` so the policy is
//! visible and the failure still ends up in the logs.

pub trait ResultExt<T> {
    /// Return the value, or log the failure at `warn` and return `default`.
    fn unwrap_or_log(self, default: T, context: &str) -> T;
}

impl<T> ResultExt<T> for Option<T> {
    fn unwrap_or_log(self, default: T, context: &str) -> T {
        match self {
            Some(v) => v,
            None => {
                tracing::warn!("missing value in {}", context);
                default
            }
        }
    }
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn unwrap_or_log(self, default: T, context: &str) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("{} failed: {}", context, e);
                default
            }
        }
    }
}
