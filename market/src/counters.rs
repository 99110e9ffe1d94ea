use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility.
///
/// Cloning shares the underlying atomics, so every component of one engine
/// reports into the same set.
#[derive(Clone, Debug, Default)]
pub struct Counters {
    pub pages_fetched: Arc<AtomicU64>,
    pub pages_failed: Arc<AtomicU64>,
    pub records_skipped: Arc<AtomicU64>,

    pub notional_cache_hits: Arc<AtomicU64>,
    pub notional_computed: Arc<AtomicU64>,

    pub samples_taken: Arc<AtomicU64>,
    pub samples_empty: Arc<AtomicU64>,

    pub watchers_launched: Arc<AtomicU64>,
    pub watchers_retargeted: Arc<AtomicU64>,
    pub watchers_stopped: Arc<AtomicU64>,
    pub signals_dropped: Arc<AtomicU64>,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn read(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
