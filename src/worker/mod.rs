//! One worker's traffic loop: pace ticks, build batches, admit and dispatch
//! each request as its own task, then drain on shutdown.
use std::fmt;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{Target, WorkerSettings};
use crate::error::{AppError, AppResult};
use crate::http::{
    ConcurrencyGate, Endpoints, MixPolicy, RateGate, RequestExecutor, RequestOutcome,
    WorkloadMixer, build_client,
};
use crate::metrics::{Stats, StatsReport, log_final, spawn_reporter};
use crate::shutdown::ShutdownReceiver;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Starting,
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// What a stopped worker hands back to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSummary {
    pub report: StatsReport,
    pub ticks: u64,
    /// Requests admitted and spawned; equals `report.total.requests` after a
    /// complete drain.
    pub dispatched: u64,
    pub expensive: u64,
    pub peak_in_flight: usize,
}

#[derive(Debug, Default)]
struct LoopCounters {
    ticks: u64,
    dispatched: u64,
    expensive: u64,
}

#[derive(Debug)]
pub struct Worker {
    index: usize,
    target: Target,
    settings: WorkerSettings,
    phase: WorkerPhase,
}

impl Worker {
    #[must_use]
    pub const fn new(index: usize, target: Target, settings: WorkerSettings) -> Self {
        Self {
            index,
            target,
            settings,
            phase: WorkerPhase::Starting,
        }
    }

    fn enter(&mut self, phase: WorkerPhase) {
        debug!("worker {} {} -> {}", self.index, self.phase, phase);
        self.phase = phase;
    }

    /// Runs until `shutdown_rx` fires (or its sender is dropped), then waits
    /// for every dispatched request before returning.
    ///
    /// # Errors
    ///
    /// Returns an error only when the connection pool or the target's URLs
    /// cannot be set up; request failures are counted, not returned.
    pub async fn run(mut self, mut shutdown_rx: ShutdownReceiver) -> AppResult<WorkerSummary> {
        let client = build_client(self.settings.concurrency).map_err(AppError::http)?;
        let endpoints = Endpoints::for_target(&self.target, &self.settings.exploratory_paths)
            .map_err(AppError::http)?;

        let stats = Arc::new(Stats::new(Instant::now()));
        let executor = RequestExecutor::new(
            client,
            Arc::clone(&stats),
            self.settings.read_response_body,
        );
        let gate = ConcurrencyGate::new(self.settings.concurrency);
        let mut rate_gate = RateGate::new(self.settings.pacing);
        let mut mixer = WorkloadMixer::new(endpoints, MixPolicy::from(&self.settings));
        let reporter = spawn_reporter(
            self.target.to_string(),
            Arc::clone(&stats),
            self.settings.report_every,
        );

        info!(
            "starting worker {} target={} pacing={:?} concurrency={} extra_random_hits={} bad_every={}s report_every={}s",
            self.index,
            self.target,
            self.settings.pacing,
            self.settings.concurrency,
            self.settings.extra_random_hits,
            self.settings.bad_every.as_secs(),
            self.settings.report_every.as_secs(),
        );

        self.enter(WorkerPhase::Running);
        let mut in_flight: JoinSet<RequestOutcome> = JoinSet::new();
        let counters = run_ticks(
            &mut shutdown_rx,
            &mut rate_gate,
            &mut mixer,
            &gate,
            &executor,
            &mut in_flight,
        )
        .await;

        self.enter(WorkerPhase::Draining);
        gate.close();
        debug!(
            "worker {} draining {} in-flight requests",
            self.index,
            in_flight.len()
        );
        while let Some(result) = in_flight.join_next().await {
            if let Err(err) = result {
                warn!("request task failed: {}", err);
            }
        }
        reporter.abort();
        if let Err(err) = reporter.await
            && !err.is_cancelled()
        {
            warn!("reporter task failed: {}", err);
        }

        self.enter(WorkerPhase::Stopped);
        let summary = WorkerSummary {
            report: stats.report(Instant::now()),
            ticks: counters.ticks,
            dispatched: counters.dispatched,
            expensive: counters.expensive,
            peak_in_flight: gate.peak(),
        };
        log_final(
            self.target.as_str(),
            &summary.report,
            summary.peak_in_flight,
            summary.expensive,
        );
        Ok(summary)
    }
}

async fn run_ticks(
    shutdown_rx: &mut ShutdownReceiver,
    rate_gate: &mut RateGate,
    mixer: &mut WorkloadMixer,
    gate: &ConcurrencyGate,
    executor: &RequestExecutor,
    in_flight: &mut JoinSet<RequestOutcome>,
) -> LoopCounters {
    let mut counters = LoopCounters::default();
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => return counters,
            () = rate_gate.wait_for_next_slot() => {}
        }
        if rate_gate.is_unbounded() {
            tokio::task::yield_now().await;
        }

        counters.ticks = counters.ticks.saturating_add(1);
        for spec in mixer.next_batch(Instant::now()) {
            let admission = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => return counters,
                admission = gate.acquire() => admission,
            };
            let Some(admission) = admission else {
                return counters;
            };

            if spec.is_expensive() {
                counters.expensive = counters.expensive.saturating_add(1);
            }
            counters.dispatched = counters.dispatched.saturating_add(1);
            let executor = executor.clone();
            in_flight.spawn(async move {
                let outcome = executor.execute(spec).await;
                admission.release();
                outcome
            });
        }

        while let Some(result) = in_flight.try_join_next() {
            if let Err(err) = result {
                warn!("request task failed: {}", err);
            }
        }
    }
}
