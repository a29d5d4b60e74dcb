use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::RequestTimeouts;

use super::defaults::{DEFAULT_CONFIG_PATH, DEFAULT_TIMEOUT_BAD, DEFAULT_TIMEOUT_NORMAL};
use super::parsers::{parse_duration_arg, parse_timeout_arg};

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run one worker process against a single target (spawned by the supervisor)
    #[command(hide = true)]
    Worker(WorkerArgs),
}

#[derive(Debug, Args, Clone)]
pub struct WorkerArgs {
    /// Normalized base URL this worker sends traffic to
    #[arg(long = "target")]
    pub target: String,

    /// Worker index, used only to label logs
    #[arg(long = "index", default_value_t = 0)]
    pub index: usize,
}

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Mixed synthetic HTTP traffic generator - paced workers with bounded concurrency, weighted read/write mixes, periodic expensive requests, and rolling stats."
)]
pub struct LoadArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to the workload config (JSON, or TOML for .toml files); created with defaults when missing
    #[arg(
        long = "config",
        env = "CONFIG",
        default_value = DEFAULT_CONFIG_PATH,
        global = true
    )]
    pub config: PathBuf,

    /// Timeout for regular requests (seconds, or with ms/s/m suffix)
    #[arg(
        long = "timeout-normal",
        env = "TIMEOUT_NORMAL",
        default_value = DEFAULT_TIMEOUT_NORMAL,
        value_parser = parse_timeout_arg,
        global = true
    )]
    pub timeout_normal: Duration,

    /// Timeout for expensive requests (seconds, or with ms/s/m suffix)
    #[arg(
        long = "timeout-bad",
        env = "TIMEOUT_BAD",
        default_value = DEFAULT_TIMEOUT_BAD,
        value_parser = parse_timeout_arg,
        global = true
    )]
    pub timeout_bad: Duration,

    /// Stop after this long and drain in-flight requests (supports ms/s/m/h); runs until interrupted otherwise
    #[arg(long = "duration", value_parser = parse_duration_arg, global = true)]
    pub duration: Option<Duration>,

    /// Enable debug logging
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Disable ANSI colors in log output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
}

impl LoadArgs {
    #[must_use]
    pub const fn timeouts(&self) -> RequestTimeouts {
        RequestTimeouts {
            normal: self.timeout_normal,
            expensive: self.timeout_bad,
        }
    }
}
