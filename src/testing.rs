//! Shared counters for the mock engines.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Load / release / call counts observed by a mock engine and its loader.
#[derive(Debug, Default)]
pub struct EngineProbe {
    loads: AtomicUsize,
    releases: AtomicUsize,
    calls: AtomicUsize,
}

impl EngineProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}
