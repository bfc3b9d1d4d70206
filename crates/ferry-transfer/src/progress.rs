//! Progress reporting hook.

/// Observer for bytes moving through a transfer.
///
/// Called from the coordinator only: on part completion for uploads, on
/// in-order sink commits for downloads. Implementations must be cheap;
/// the engine calls this on the hot path.
pub trait Progress: Send + Sync {
    fn on_bytes(&self, n: u64);
}

/// Discards all progress events.
pub struct NoProgress;

impl Progress for NoProgress {
    fn on_bytes(&self, _n: u64) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct Counter(AtomicU64);

    impl Progress for Counter {
        fn on_bytes(&self, n: u64) {
            self.0.fetch_add(n, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_observer_accumulates() {
        let counter = Counter(AtomicU64::new(0));
        counter.on_bytes(10);
        counter.on_bytes(32);
        assert_eq!(counter.0.load(Ordering::Relaxed), 42);
        NoProgress.on_bytes(99);
    }
}
