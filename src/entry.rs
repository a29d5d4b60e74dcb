use clap::Parser;
use tracing::{Instrument, error, info, info_span};

use crate::args::{Command, LoadArgs, WorkerArgs};
use crate::config::{Target, load_or_create_config};
use crate::error::{AppError, AppResult};
use crate::fanout::ProcessFanout;
use crate::shutdown_handlers::{
    setup_deadline_shutdown_handler, setup_signal_shutdown_handler, shutdown_channel,
};
use crate::worker::Worker;

/// Binary entry point: parse the CLI, then either supervise the worker fleet
/// or, in a spawned child, run a single worker.
///
/// # Errors
///
/// Returns an error for configuration problems, a worker that cannot start,
/// or a fleet in which every worker failed.
pub fn run() -> AppResult<()> {
    let args = LoadArgs::parse();
    crate::logger::init_logging(args.verbose, args.no_color);

    let result = match args.command.as_ref() {
        Some(Command::Worker(worker)) => run_worker_process(&args, worker),
        None => run_supervisor(&args),
    };
    if let Err(err) = result.as_ref() {
        error!("{}", err);
    }
    result
}

fn build_runtime() -> AppResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(AppError::from)
}

fn run_supervisor(args: &LoadArgs) -> AppResult<()> {
    let loaded = load_or_create_config(&args.config)?;
    let plan = loaded
        .config
        .resolve(args.timeouts())
        .map_err(AppError::config)?;

    info!(
        "config={} {}",
        loaded.path.display(),
        if loaded.created {
            "(created default)"
        } else {
            "(loaded)"
        }
    );
    let targets: Vec<&str> = plan.targets.iter().map(Target::as_str).collect();
    info!("targets={:?}", targets);
    info!(
        "processes_per_target={} total_workers={}",
        plan.processes_per_target,
        plan.total_workers()
    );
    info!(
        "report_every_seconds={} timeout_normal={:?} timeout_bad={:?}",
        plan.worker.report_every.as_secs(),
        plan.worker.timeouts.normal,
        plan.worker.timeouts.expensive
    );

    let fanout = ProcessFanout::from_plan(&plan, args)?;
    build_runtime()?.block_on(async {
        let (shutdown_tx, _shutdown_rx) = shutdown_channel();
        let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
        let deadline_handle = args
            .duration
            .map(|after| setup_deadline_shutdown_handler(&shutdown_tx, after));

        let result = fanout.run(&shutdown_tx).await;

        signal_handle.abort();
        if let Some(handle) = deadline_handle {
            handle.abort();
        }
        result.map(|_| ())
    })
}

fn run_worker_process(args: &LoadArgs, worker: &WorkerArgs) -> AppResult<()> {
    let loaded = load_or_create_config(&args.config)?;
    let settings = loaded
        .config
        .worker_settings(args.timeouts())
        .map_err(AppError::config)?;
    let target = Target::parse(&worker.target, &loaded.config.scheme).map_err(AppError::config)?;
    let span = info_span!("worker", index = worker.index, base_url = %target);

    build_runtime()?.block_on(async {
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
        let deadline_handle = args
            .duration
            .map(|after| setup_deadline_shutdown_handler(&shutdown_tx, after));

        let result = Worker::new(worker.index, target, settings)
            .run(shutdown_rx)
            .instrument(span)
            .await;

        signal_handle.abort();
        if let Some(handle) = deadline_handle {
            handle.abort();
        }
        result.map(|_| ())
    })
}
