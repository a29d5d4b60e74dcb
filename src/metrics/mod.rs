//! Per-worker request counters and the periodic progress reporter.
mod reporter;
mod stats;

#[cfg(test)]
mod tests;

pub use reporter::{log_final, log_progress, spawn_reporter};
pub use stats::{CounterSnapshot, Stats, StatsReport};
