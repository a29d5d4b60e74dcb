use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::*;
use crate::error::{AppError, AppResult};
use crate::http::RequestOutcome;
use crate::test_support::run_paused_test;

const RATE_TOLERANCE: f64 = 1e-9;

fn record_mix(stats: &Stats) {
    stats.record(RequestOutcome::Success { status: 200 });
    stats.record(RequestOutcome::Success { status: 302 });
    stats.record(RequestOutcome::BadStatus { status: 503 });
    stats.record(RequestOutcome::TimedOut);
    stats.record(RequestOutcome::TransportError);
}

fn later(base: Instant, secs: u64) -> AppResult<Instant> {
    base.checked_add(Duration::from_secs(secs))
        .ok_or_else(|| AppError::validation("Instant overflow"))
}

#[test]
fn outcomes_land_in_exactly_one_bucket() -> AppResult<()> {
    let stats = Stats::new(Instant::now());
    record_mix(&stats);

    let totals = stats.totals();
    let expected = CounterSnapshot {
        requests: 5,
        ok: 2,
        bad_status: 1,
        exceptions: 2,
        timeouts: 1,
    };
    if totals != expected {
        return Err(AppError::validation(format!("Unexpected totals {:?}", totals)));
    }
    if totals.ok.saturating_add(totals.bad_status).saturating_add(totals.exceptions)
        != totals.requests
    {
        return Err(AppError::validation("Buckets should partition requests"));
    }
    if stats.window() != totals {
        return Err(AppError::validation("Window should mirror totals before a report"));
    }
    Ok(())
}

#[test]
fn take_report_resets_only_the_window() -> AppResult<()> {
    let start = Instant::now();
    let stats = Stats::new(start);
    record_mix(&stats);

    let first = stats.take_report(later(start, 10)?);
    if first.window.requests != 5 || first.total.requests != 5 {
        return Err(AppError::validation("First report should see everything"));
    }
    if first.window_elapsed != Duration::from_secs(10) {
        return Err(AppError::validation("First window should start at startup"));
    }
    if stats.window() != CounterSnapshot::default() {
        return Err(AppError::validation("Window was not reset"));
    }
    if stats.window_started_at() != later(start, 10)? {
        return Err(AppError::validation("Window start was not moved"));
    }

    stats.record(RequestOutcome::Success { status: 200 });
    let second = stats.take_report(later(start, 15)?);
    if second.window.requests != 1 || second.window_elapsed != Duration::from_secs(5) {
        return Err(AppError::validation("Second window should cover only new work"));
    }
    if second.total.requests != 6 || second.total_elapsed != Duration::from_secs(15) {
        return Err(AppError::validation("Totals must keep accumulating"));
    }
    Ok(())
}

#[test]
fn report_does_not_reset_window() -> AppResult<()> {
    let start = Instant::now();
    let stats = Stats::new(start);
    record_mix(&stats);

    let report = stats.report(later(start, 2)?);
    if report.window.requests != 5 || stats.window().requests != 5 {
        return Err(AppError::validation("Plain report should leave the window alone"));
    }
    Ok(())
}

#[test]
fn rates_divide_by_elapsed_time() -> AppResult<()> {
    let start = Instant::now();
    let stats = Stats::new(start);
    for _ in 0..20 {
        stats.record(RequestOutcome::Success { status: 200 });
    }
    let first = stats.take_report(later(start, 4)?);
    if (first.window_rps() - 5.0).abs() > RATE_TOLERANCE {
        return Err(AppError::validation(format!(
            "Unexpected window rps {}",
            first.window_rps()
        )));
    }

    for _ in 0..10 {
        stats.record(RequestOutcome::TransportError);
    }
    let second = stats.take_report(later(start, 6)?);
    if (second.window_rps() - 5.0).abs() > RATE_TOLERANCE {
        return Err(AppError::validation("Window rps should use the window length"));
    }
    if (second.total_rps() - 5.0).abs() > RATE_TOLERANCE {
        return Err(AppError::validation("Total rps should use time since start"));
    }
    Ok(())
}

#[test]
fn zero_elapsed_rate_is_finite() -> AppResult<()> {
    let start = Instant::now();
    let stats = Stats::new(start);
    stats.record(RequestOutcome::Success { status: 200 });
    let report = stats.report(start);
    if !report.window_rps().is_finite() || !report.total_rps().is_finite() {
        return Err(AppError::validation("Rate over an empty window must stay finite"));
    }
    Ok(())
}

#[test]
fn concurrent_records_are_not_lost() -> AppResult<()> {
    let stats = Arc::new(Stats::new(Instant::now()));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let stats = Arc::clone(&stats);
            std::thread::spawn(move || {
                for _ in 0..1_000 {
                    stats.record(RequestOutcome::Success { status: 200 });
                }
            })
        })
        .collect();
    for handle in handles {
        handle
            .join()
            .map_err(|err| AppError::validation(format!("Recorder thread panicked: {:?}", err)))?;
    }
    if stats.totals().requests != 4_000 || stats.totals().ok != 4_000 {
        return Err(AppError::validation("Concurrent records were lost"));
    }
    Ok(())
}

#[test]
fn reporter_resets_window_each_period() -> AppResult<()> {
    run_paused_test(async {
        let stats = Arc::new(Stats::new(Instant::now()));
        let reporter = spawn_reporter(
            "http://127.0.0.1:8080".to_owned(),
            Arc::clone(&stats),
            Duration::from_secs(2),
        );
        record_mix(&stats);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        if stats.window().requests != 5 {
            return Err(AppError::validation("Reporter fired before its first period"));
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
        if stats.window().requests != 0 {
            return Err(AppError::validation("Reporter did not reset the window"));
        }
        if stats.totals().requests != 5 {
            return Err(AppError::validation("Reporter must not touch totals"));
        }

        reporter.abort();
        Ok(())
    })
}
