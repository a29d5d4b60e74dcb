use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use crate::http::RequestOutcome;

/// Lower bound for elapsed time when deriving rates.
const MIN_RATE_ELAPSED: Duration = Duration::from_millis(1);

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    ok: AtomicU64,
    bad_status: AtomicU64,
    exceptions: AtomicU64,
    timeouts: AtomicU64,
}

impl Counters {
    fn record(&self, outcome: RequestOutcome) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        match outcome {
            RequestOutcome::Success { .. } => {
                self.ok.fetch_add(1, Ordering::Relaxed);
            }
            RequestOutcome::BadStatus { .. } => {
                self.bad_status.fetch_add(1, Ordering::Relaxed);
            }
            RequestOutcome::TimedOut => {
                self.exceptions.fetch_add(1, Ordering::Relaxed);
                self.timeouts.fetch_add(1, Ordering::Relaxed);
            }
            RequestOutcome::TransportError => {
                self.exceptions.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn load(&self) -> CounterSnapshot {
        CounterSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            ok: self.ok.load(Ordering::Relaxed),
            bad_status: self.bad_status.load(Ordering::Relaxed),
            exceptions: self.exceptions.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }

    fn take(&self) -> CounterSnapshot {
        CounterSnapshot {
            requests: self.requests.swap(0, Ordering::Relaxed),
            ok: self.ok.swap(0, Ordering::Relaxed),
            bad_status: self.bad_status.swap(0, Ordering::Relaxed),
            exceptions: self.exceptions.swap(0, Ordering::Relaxed),
            timeouts: self.timeouts.swap(0, Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub requests: u64,
    pub ok: u64,
    pub bad_status: u64,
    /// Transport failures, timeouts included.
    pub exceptions: u64,
    pub timeouts: u64,
}

impl CounterSnapshot {
    #[must_use]
    pub fn rate_per_sec(&self, elapsed: Duration) -> f64 {
        self.requests as f64 / elapsed.max(MIN_RATE_ELAPSED).as_secs_f64()
    }
}

/// Counters of one worker: cumulative totals plus a rolling window that the
/// reporter resets. Updates are lock-free and order-independent.
#[derive(Debug)]
pub struct Stats {
    started_at: Instant,
    /// Window start as an offset from `started_at`.
    window_offset_nanos: AtomicU64,
    total: Counters,
    window: Counters,
}

/// Window and cumulative counts read at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsReport {
    pub window: CounterSnapshot,
    pub window_elapsed: Duration,
    pub total: CounterSnapshot,
    pub total_elapsed: Duration,
}

impl StatsReport {
    #[must_use]
    pub fn window_rps(&self) -> f64 {
        self.window.rate_per_sec(self.window_elapsed)
    }

    #[must_use]
    pub fn total_rps(&self) -> f64 {
        self.total.rate_per_sec(self.total_elapsed)
    }
}

impl Stats {
    #[must_use]
    pub fn new(started_at: Instant) -> Self {
        Self {
            started_at,
            window_offset_nanos: AtomicU64::new(0),
            total: Counters::default(),
            window: Counters::default(),
        }
    }

    /// Counts one completed attempt in both the totals and the window.
    pub fn record(&self, outcome: RequestOutcome) {
        self.total.record(outcome);
        self.window.record(outcome);
    }

    #[must_use]
    pub fn totals(&self) -> CounterSnapshot {
        self.total.load()
    }

    #[must_use]
    pub fn window(&self) -> CounterSnapshot {
        self.window.load()
    }

    #[must_use]
    pub fn window_started_at(&self) -> Instant {
        let offset = Duration::from_nanos(self.window_offset_nanos.load(Ordering::Acquire));
        self.started_at
            .checked_add(offset)
            .unwrap_or(self.started_at)
    }

    /// Snapshots window and totals, then starts a fresh window at `now`.
    #[must_use]
    pub fn take_report(&self, now: Instant) -> StatsReport {
        let window_elapsed = now.saturating_duration_since(self.window_started_at());
        let window = self.window.take();
        let offset = now.saturating_duration_since(self.started_at).as_nanos();
        self.window_offset_nanos
            .store(u64::try_from(offset).unwrap_or(u64::MAX), Ordering::Release);

        StatsReport {
            window,
            window_elapsed,
            total: self.total.load(),
            total_elapsed: now.saturating_duration_since(self.started_at),
        }
    }

    /// Snapshot without resetting the window.
    #[must_use]
    pub fn report(&self, now: Instant) -> StatsReport {
        StatsReport {
            window: self.window.load(),
            window_elapsed: now.saturating_duration_since(self.window_started_at()),
            total: self.total.load(),
            total_elapsed: now.saturating_duration_since(self.started_at),
        }
    }
}
