//! Cooperative cancellation for long-running generations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, TrellisError};

/// Trait for anything that can report a cancellation request.
pub trait Cancellable: Send + Sync {
    fn is_cancelled(&self) -> bool;

    /// Return `Err(Cancelled)` when cancellation was requested.
    fn check(&self, stage: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(TrellisError::Cancelled(stage.to_string()));
        }
        Ok(())
    }
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. Running generations stop at their next check.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellable for CancellationToken {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_flag() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
        assert!(matches!(
            other.check("traversal"),
            Err(TrellisError::Cancelled(stage)) if stage == "traversal"
        ));
    }
}
