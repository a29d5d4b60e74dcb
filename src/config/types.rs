use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_TARGET: &str = "localhost:8080";
pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_RANDOM_URL_PATHS: [&str; 5] =
    ["/", "/health", "/api/products", "/api/orders", "/api/bad"];

const DEFAULT_QPS_PER_PROCESS: f64 = 1.5;
const DEFAULT_BAD_EVERY_SECONDS: u64 = 20;
const DEFAULT_ASYNC_CONCURRENCY: usize = 50;
const DEFAULT_EXTRA_RANDOM_HITS: usize = 1;
const DEFAULT_REPORT_EVERY_SECONDS: u64 = 10;

const DEFAULT_TIMEOUT_NORMAL: Duration = Duration::from_millis(2_500);
const DEFAULT_TIMEOUT_EXPENSIVE: Duration = Duration::from_secs(30);

/// On-disk workload description. Every field is optional in the file and
/// falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// `host[:port]` strings or full base URLs.
    pub targets: Vec<String>,
    /// Scheme prepended to targets that do not carry one.
    pub scheme: String,
    /// Ticks per second per worker; `<= 0` leaves only the concurrency limit.
    pub qps_per_process: f64,
    pub bad_every_seconds: u64,
    /// Workers per target; `0` means one per logical CPU.
    pub processes_per_target: usize,
    /// In-flight request limit per worker.
    pub async_concurrency: usize,
    pub extra_random_hits: usize,
    pub random_url_paths: Vec<String>,
    pub report_every_seconds: u64,
    /// Drain response bodies instead of dropping them after the status line.
    pub read_response_body: bool,
    /// `mode` values for the expensive endpoint; empty lets the target pick.
    pub bad_modes: Vec<String>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            targets: vec![DEFAULT_TARGET.to_owned()],
            scheme: DEFAULT_SCHEME.to_owned(),
            qps_per_process: DEFAULT_QPS_PER_PROCESS,
            bad_every_seconds: DEFAULT_BAD_EVERY_SECONDS,
            processes_per_target: 0,
            async_concurrency: DEFAULT_ASYNC_CONCURRENCY,
            extra_random_hits: DEFAULT_EXTRA_RANDOM_HITS,
            random_url_paths: DEFAULT_RANDOM_URL_PATHS
                .iter()
                .map(|path| (*path).to_owned())
                .collect(),
            report_every_seconds: DEFAULT_REPORT_EVERY_SECONDS,
            read_response_body: true,
            bad_modes: Vec::new(),
        }
    }
}

/// Per-kind request timeouts, taken from the CLI/environment rather than the
/// config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeouts {
    pub normal: Duration,
    pub expensive: Duration,
}

impl Default for RequestTimeouts {
    fn default() -> Self {
        Self {
            normal: DEFAULT_TIMEOUT_NORMAL,
            expensive: DEFAULT_TIMEOUT_EXPENSIVE,
        }
    }
}
