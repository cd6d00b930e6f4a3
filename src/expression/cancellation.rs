//! Cooperative cancellation of running evaluations.

use crate::expression::error::CancellationError;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag that long-running evaluation steps poll.
#[derive(Debug, Default)]
pub struct CancellationHandle {
    cancelled: AtomicBool,
}

impl CancellationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. All evaluations polling this handle abort at
    /// their next check.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            log::debug!("Cancellation requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns an error naming `detail` if cancellation was requested.
    pub fn throw_if_cancelled(&self, detail: impl FnOnce() -> String) -> Result<(), CancellationError> {
        if self.is_cancelled() {
            let detail = detail();
            log::warn!("Aborting evaluation during {}", detail);
            return Err(CancellationError { detail });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel() {
        let handle = CancellationHandle::new();
        assert!(!handle.is_cancelled());
        assert!(handle.throw_if_cancelled(|| "nothing".to_string()).is_ok());

        handle.cancel();
        assert!(handle.is_cancelled());
        let err = handle
            .throw_if_cancelled(|| "aggregate".to_string())
            .unwrap_err();
        assert_eq!(err.detail, "aggregate");
    }
}
