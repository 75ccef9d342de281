//! ControlSignal - cross-context request flag
//!
//! Shutdown and reinit requests may be raised from signal handlers or other
//! threads while the acquisition loop reads and clears them. The flag is a
//! lock-free atomic; raising it never blocks and never allocates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cheap-to-clone cancellation token backed by an `AtomicBool`
#[derive(Debug, Clone, Default)]
pub struct ControlSignal {
    flag: Arc<AtomicBool>,
}

impl ControlSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the request. Safe to call from any context.
    #[inline]
    pub fn request(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Check the request without clearing it
    #[inline]
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Clear the request, returning whether it was raised.
    ///
    /// A single raise is observed by exactly one `take`.
    #[inline]
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_clears_once() {
        let signal = ControlSignal::new();
        assert!(!signal.take());

        signal.request();
        assert!(signal.is_requested());
        assert!(signal.take());
        assert!(!signal.take());
        assert!(!signal.is_requested());
    }

    #[test]
    fn test_clones_share_state() {
        let signal = ControlSignal::new();
        let remote = signal.clone();

        std::thread::spawn(move || remote.request()).join().unwrap();

        assert!(signal.is_requested());
    }
}
