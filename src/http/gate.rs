use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting admission gate bounding in-flight requests of one worker.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    permits: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// One admitted request. Dropping it returns the permit.
#[derive(Debug)]
pub struct Admission {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl ConcurrencyGate {
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity.get())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Waits for a free permit. Returns `None` once the gate is closed.
    pub async fn acquire(&self) -> Option<Admission> {
        let permit = Arc::clone(&self.permits).acquire_owned().await.ok()?;
        let previous = self.in_flight.fetch_add(1, Ordering::AcqRel);
        self.peak
            .fetch_max(previous.saturating_add(1), Ordering::AcqRel);
        Some(Admission {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Makes pending and future `acquire` calls return `None`.
    pub fn close(&self) {
        self.permits.close();
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of simultaneously admitted requests seen so far.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }
}

impl Admission {
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for Admission {
    fn drop(&mut self) {
        // Counted up before this admission existed, so never below one here.
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
