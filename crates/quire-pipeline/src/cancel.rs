// SPDX-License-Identifier: MIT
//
// Cooperative cancellation. The token is checked at pipeline checkpoints
// and between page copies, never mid-copy; cancelling discards the
// partially built output and leaves the input untouched, so it is always
// safe to abort.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use quire_core::error::{EngineError, Result};

/// Shared cancellation flag. Clone it into whatever thread or task needs
/// to request an abort.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent; the pipeline notices at its next
    /// checkpoint.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Checkpoint: error out with [`EngineError::Cancelled`] if an abort
    /// has been requested.
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        Ok(())
    }
}
