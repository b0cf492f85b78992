//! Cooperative cancellation flag, one per operation.
//!
//! A [`CancellationToken`] is polled, never waited on.  Sessions hand every
//! top-level operation a fresh token, so a `cancel()` issued while nothing is
//! running never reaches the next operation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared, lock-free cancellation signal.
///
/// Cloning yields a handle to the same flag, so a clone can be moved to
/// another thread and used to stop a stream in progress.
///
/// ```rust
/// use speech_session::CancellationToken;
///
/// let token = CancellationToken::new();
/// let remote = token.clone();
/// remote.cancel();
/// assert!(token.is_cancelled());
/// token.reset();
/// assert!(!remote.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.  Callable from any thread at any time.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_clear() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn cancel_is_visible_across_threads() {
        let token = CancellationToken::new();
        let remote = token.clone();
        std::thread::spawn(move || remote.cancel())
            .join()
            .expect("cancel thread");
        assert!(token.is_cancelled());
    }

    #[test]
    fn reset_clears_every_clone() {
        let token = CancellationToken::new();
        let other = token.clone();
        token.cancel();
        other.reset();
        assert!(!token.is_cancelled());
    }
}
