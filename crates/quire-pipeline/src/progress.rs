// SPDX-License-Identifier: MIT
//
// Progress reporting. Callers get coarse percentage callbacks at the
// pipeline checkpoints and per page during transforms; the reporter
// guarantees the percentage never goes backwards, whatever order the
// stages feed it.

use std::sync::Arc;

/// Callback invoked with `(percent, message)`; percent is 0..=100 and
/// monotonically non-decreasing across one run.
pub type ProgressCallback = Arc<dyn Fn(u8, &str) + Send + Sync>;

/// Clamps and forwards progress updates to an optional callback.
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    last: u8,
}

impl ProgressReporter {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self { callback, last: 0 }
    }

    /// Report a progress point. Values above 100 are capped; values below
    /// the last reported figure are raised to it so the visible number
    /// never regresses.
    pub fn report(&mut self, percent: u8, message: &str) {
        let clamped = percent.min(100).max(self.last);
        self.last = clamped;
        if let Some(callback) = &self.callback {
            callback(clamped, message);
        }
    }

    /// Linear interpolation helper for per-page loops: maps `done/total`
    /// into the `[from, to]` band.
    pub fn report_span(&mut self, from: u8, to: u8, done: u32, total: u32, message: &str) {
        let total = total.max(1);
        let span = u32::from(to.saturating_sub(from));
        let percent = u32::from(from) + span * done.min(total) / total;
        self.report(percent as u8, message);
    }

    /// Last percentage handed to the callback.
    pub fn last(&self) -> u8 {
        self.last
    }
}
