//! Supervisor that runs every worker as its own OS process, so stats and
//! connection pools are isolated by construction.
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::args::LoadArgs;
use crate::config::{RunPlan, Target};
use crate::error::{AppError, AppResult, FanoutError};
use crate::shutdown::{ShutdownReceiver, ShutdownSender};


/// One worker process to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerLaunch {
    pub index: usize,
    pub target: Target,
}

/// Tally of worker exits once every child is gone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutSummary {
    pub launched: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct ProcessFanout {
    program: PathBuf,
    /// Flags placed before the `worker` subcommand of every child.
    global_args: Vec<OsString>,
    launches: Vec<WorkerLaunch>,
}

impl ProcessFanout {
    /// Plans `processes_per_target` workers for every target, re-running the
    /// current executable with the caller's config and timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error when the current executable cannot be located.
    pub fn from_plan(plan: &RunPlan, args: &LoadArgs) -> AppResult<Self> {
        let program = std::env::current_exe()
            .map_err(|source| AppError::fanout(FanoutError::CurrentExe { source }))?;
        Ok(Self::new(program, forwarded_args(args), plan_launches(plan)))
    }

    #[must_use]
    pub const fn new(
        program: PathBuf,
        global_args: Vec<OsString>,
        launches: Vec<WorkerLaunch>,
    ) -> Self {
        Self {
            program,
            global_args,
            launches,
        }
    }

    #[must_use]
    pub fn launches(&self) -> &[WorkerLaunch] {
        &self.launches
    }

    /// Full argument list of one child process.
    #[must_use]
    pub fn worker_args(&self, launch: &WorkerLaunch) -> Vec<OsString> {
        let mut args = self.global_args.clone();
        args.extend([
            OsString::from("worker"),
            OsString::from("--target"),
            OsString::from(launch.target.as_str()),
            OsString::from("--index"),
            OsString::from(launch.index.to_string()),
        ]);
        args
    }

    /// Starts every worker and waits for all of them. On shutdown each live
    /// child is asked to drain and is then awaited.
    ///
    /// # Errors
    ///
    /// Returns an error only when no worker ran successfully.
    pub async fn run(self, shutdown_tx: &ShutdownSender) -> AppResult<FanoutSummary> {
        let mut summary = FanoutSummary::default();
        let mut children = JoinSet::new();

        for launch in &self.launches {
            summary.launched = summary.launched.saturating_add(1);
            let mut command = Command::new(&self.program);
            command
                .args(self.worker_args(launch))
                .stdin(Stdio::null())
                .kill_on_drop(true);
            match command.spawn() {
                Ok(child) => {
                    info!(
                        "spawned worker {} target={} pid={}",
                        launch.index,
                        launch.target,
                        child.id().unwrap_or_default()
                    );
                    children.spawn(supervise(launch.clone(), child, shutdown_tx.subscribe()));
                }
                Err(source) => {
                    error!(
                        "{}",
                        FanoutError::SpawnWorker {
                            index: launch.index,
                            target: launch.target.to_string(),
                            source,
                        }
                    );
                    summary.failed = summary.failed.saturating_add(1);
                }
            }
        }

        while let Some(result) = children.join_next().await {
            match result {
                Ok(true) => summary.succeeded = summary.succeeded.saturating_add(1),
                Ok(false) => summary.failed = summary.failed.saturating_add(1),
                Err(err) => {
                    error!("worker supervision task failed: {}", err);
                    summary.failed = summary.failed.saturating_add(1);
                }
            }
        }

        info!(
            "all workers exited: launched={} succeeded={} failed={}",
            summary.launched, summary.succeeded, summary.failed
        );
        if summary.launched > 0 && summary.succeeded == 0 {
            return Err(AppError::fanout(FanoutError::AllWorkersFailed {
                count: summary.launched,
            }));
        }
        Ok(summary)
    }
}

/// Waits for one child; forwards shutdown to it. Returns whether it exited
/// cleanly.
async fn supervise(
    launch: WorkerLaunch,
    mut child: Child,
    mut shutdown_rx: ShutdownReceiver,
) -> bool {
    let (status, drain_requested) = tokio::select! {
        status = child.wait() => (status, false),
        _ = shutdown_rx.recv() => {
            request_drain(&mut child);
            (child.wait().await, true)
        }
    };
    match status {
        Ok(status) if status.success() => {
            info!("worker {} ({}) exited cleanly", launch.index, launch.target);
            true
        }
        // A child still starting up has no handler yet and dies on the signal.
        Ok(status) if drain_requested && stopped_by_drain(status) => {
            info!(
                "worker {} ({}) stopped before it started sending",
                launch.index, launch.target
            );
            true
        }
        Ok(status) => {
            error!(
                "worker {} ({}) exited with {}",
                launch.index, launch.target, status
            );
            false
        }
        Err(err) => {
            error!(
                "failed to wait for worker {} ({}): {}",
                launch.index, launch.target, err
            );
            false
        }
    }
}

#[cfg(unix)]
fn request_drain(child: &mut Child) {
    let Some(pid) = child.id().and_then(|id| libc::pid_t::try_from(id).ok()) else {
        return;
    };
    // SAFETY: `kill` has no memory-safety preconditions; `pid` belongs to a
    // child we have not reaped yet, so it cannot name a recycled process.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc != 0 {
        warn!(
            "failed to signal worker pid={}: {}",
            pid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(unix)]
fn stopped_by_drain(status: ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;

    status.signal() == Some(libc::SIGTERM)
}

/// Elsewhere the drain request is a kill, so any exit after it is expected.
#[cfg(not(unix))]
const fn stopped_by_drain(_status: ExitStatus) -> bool {
    true
}

#[cfg(not(unix))]
fn request_drain(child: &mut Child) {
    if let Err(err) = child.start_kill() {
        warn!("failed to stop worker: {}", err);
    }
}

fn plan_launches(plan: &RunPlan) -> Vec<WorkerLaunch> {
    plan.targets
        .iter()
        .flat_map(|target| std::iter::repeat_n(target, plan.processes_per_target.get()))
        .enumerate()
        .map(|(index, target)| WorkerLaunch {
            index,
            target: target.clone(),
        })
        .collect()
}

fn forwarded_args(args: &LoadArgs) -> Vec<OsString> {
    let mut forwarded = vec![
        OsString::from("--config"),
        args.config.clone().into_os_string(),
        OsString::from("--timeout-normal"),
        OsString::from(args.timeout_normal.as_secs_f64().to_string()),
        OsString::from("--timeout-bad"),
        OsString::from(args.timeout_bad.as_secs_f64().to_string()),
    ];
    if args.verbose {
        forwarded.push(OsString::from("--verbose"));
    }
    if args.no_color {
        forwarded.push(OsString::from("--no-color"));
    }
    forwarded
}
