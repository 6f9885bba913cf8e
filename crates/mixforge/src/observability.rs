//! Structured logging helpers
//!
//! Every [`Forge`](crate::Forge) operation runs under an [`OperationTimer`],
//! which logs its outcome and duration through `tracing`.

use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Timer for measuring one engine operation
#[derive(Debug)]
pub struct OperationTimer {
    operation: &'static str,
    start: Instant,
}

impl OperationTimer {
    /// Start timing `operation`
    pub fn start(operation: &'static str) -> Self {
        debug!(operation, "Operation started");
        Self {
            operation,
            start: Instant::now(),
        }
    }

    /// Name of the timed operation
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Get elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Log the outcome and pass the result through
    pub fn finish<T, E: std::fmt::Display>(self, result: Result<T, E>) -> Result<T, E> {
        let elapsed_us = self.elapsed().as_micros();
        match &result {
            Ok(_) => debug!(operation = self.operation, elapsed_us, "Operation completed"),
            Err(e) => warn!(
                operation = self.operation,
                elapsed_us,
                error = %e,
                "Operation failed"
            ),
        }
        result
    }
}

/// Install a global `tracing` subscriber filtered by `RUST_LOG`.
///
/// Defaults to `info` when `RUST_LOG` is unset. Calling this more than once
/// is harmless; only the first call installs a subscriber.
#[cfg(feature = "trace")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::start("dumps");
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(timer.operation(), "dumps");
        assert!(timer.elapsed().as_millis() >= 10);
    }

    #[test]
    fn test_finish_passes_result_through() {
        let ok: Result<u8, String> = OperationTimer::start("flatten").finish(Ok(3));
        assert_eq!(ok, Ok(3));

        let err: Result<u8, String> = OperationTimer::start("flatten").finish(Err("boom".into()));
        assert_eq!(err, Err("boom".to_string()));
    }

    #[cfg(feature = "trace")]
    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
