use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable request to end a run at the next iteration boundary.
///
/// An in-flight frame write is always allowed to finish first.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Withdraw a pending request.
    pub(crate) fn clear(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}
