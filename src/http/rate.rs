use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{Instant, sleep_until};

use crate::config::Pacing;

/// Bounds of the multiplicative jitter applied to every tick interval.
pub(crate) const JITTER_MIN: f64 = 0.7;
pub(crate) const JITTER_MAX: f64 = 1.3;

/// Per-worker pacing. Each consumed slot schedules the next one a jittered
/// interval later so workers sharing a nominal rate drift apart.
#[derive(Debug)]
pub struct RateGate<R = StdRng> {
    pacing: Pacing,
    next_slot: Option<Instant>,
    rng: R,
}

impl RateGate<StdRng> {
    #[must_use]
    pub fn new(pacing: Pacing) -> Self {
        Self::with_rng(pacing, StdRng::from_entropy())
    }
}

impl<R: Rng> RateGate<R> {
    pub const fn with_rng(pacing: Pacing, rng: R) -> Self {
        Self {
            pacing,
            next_slot: None,
            rng,
        }
    }

    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        matches!(self.pacing, Pacing::Unbounded)
    }

    /// Waits until the next dispatch is permitted. The first call never
    /// waits; in unbounded mode no call does.
    pub async fn wait_for_next_slot(&mut self) {
        let Pacing::Every(interval) = self.pacing else {
            return;
        };
        if let Some(deadline) = self.next_slot {
            sleep_until(deadline).await;
        }
        let gap = jittered_interval(interval, &mut self.rng);
        let now = Instant::now();
        self.next_slot = Some(now.checked_add(gap).unwrap_or(now));
    }
}

pub(crate) fn jittered_interval<R: Rng>(interval: Duration, rng: &mut R) -> Duration {
    interval.mul_f64(rng.gen_range(JITTER_MIN..=JITTER_MAX))
}
