use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::info;

use super::stats::{Stats, StatsReport};

const MIN_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Starts the task that logs a progress line every `every` and resets the
/// rolling window. The first report fires one interval after start.
pub fn spawn_reporter(base_url: String, stats: Arc<Stats>, every: Duration) -> JoinHandle<()> {
    let period = every.max(MIN_REPORT_INTERVAL);
    tokio::spawn(async move {
        let now = Instant::now();
        let mut report_tick = interval_at(now.checked_add(period).unwrap_or(now), period);
        report_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            report_tick.tick().await;
            let report = stats.take_report(Instant::now());
            log_progress(&base_url, &report);
        }
    })
}

pub fn log_progress(base_url: &str, report: &StatsReport) {
    info!(
        base_url,
        window_secs = report.window_elapsed.as_secs_f64(),
        window_rps = report.window_rps(),
        window_ok = report.window.ok,
        window_bad_status = report.window.bad_status,
        window_exceptions = report.window.exceptions,
        window_timeouts = report.window.timeouts,
        total_secs = report.total_elapsed.as_secs_f64(),
        total_rps = report.total_rps(),
        total_requests = report.total.requests,
        total_ok = report.total.ok,
        total_bad_status = report.total.bad_status,
        total_exceptions = report.total.exceptions,
        total_timeouts = report.total.timeouts,
        "progress"
    );
}

pub fn log_final(base_url: &str, report: &StatsReport, peak_in_flight: usize, expensive: u64) {
    info!(
        base_url,
        total_secs = report.total_elapsed.as_secs_f64(),
        total_rps = report.total_rps(),
        total_requests = report.total.requests,
        total_ok = report.total.ok,
        total_bad_status = report.total.bad_status,
        total_exceptions = report.total.exceptions,
        total_timeouts = report.total.timeouts,
        expensive,
        peak_in_flight,
        "worker stopped"
    );
}
