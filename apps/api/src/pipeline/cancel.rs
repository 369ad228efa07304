//! Cooperative cancellation, checked by the orchestrator between stages.
//!
//! An in-flight generation call is never interrupted; cancellation takes effect
//! at the next stage boundary.

use tokio::sync::watch;

/// Held by the caller; flips the signal for every clone of the paired `CancelSignal`.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Read side, passed into a run through `RunOptions`.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        // send_replace succeeds even when every receiver is gone
        self.tx.send_replace(true);
    }
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_starts_clear() {
        let (_handle, signal) = cancel_pair();
        assert!(!signal.is_cancelled());
    }

    #[test]
    fn test_cancel_is_seen_by_all_clones() {
        let (handle, signal) = cancel_pair();
        let other = signal.clone();
        handle.cancel();
        assert!(signal.is_cancelled());
        assert!(other.is_cancelled());
    }
}
