//! Cancellation scope tying async work to a mounted view.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cancelled once when the owning view is torn down. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct ViewScope {
    cancelled: Arc<AtomicBool>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            tracing::debug!("view scope cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
