use std::num::NonZeroUsize;
use std::time::Duration;

use crate::error::ConfigError;

use super::target::{Target, normalize_path};
use super::types::{DEFAULT_RANDOM_URL_PATHS, DEFAULT_TARGET, RequestTimeouts, WorkloadConfig};

/// Longest accepted gap between ticks; lower rates are rejected as typos.
const MAX_TICK_INTERVAL: Duration = Duration::from_secs(3_600);
const MIN_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Dispatch cadence of one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// No rate limit; the concurrency gate is the only throttle.
    Unbounded,
    /// Nominal gap between ticks before jitter.
    Every(Duration),
}

impl Pacing {
    /// Derives the pacing for a per-process tick rate.
    ///
    /// # Errors
    ///
    /// Returns an error when the rate is not finite or is below one tick per
    /// hour.
    pub fn from_qps(qps: f64) -> Result<Self, ConfigError> {
        if !qps.is_finite() {
            return Err(ConfigError::RateNotFinite { value: qps });
        }
        if qps <= 0.0 {
            return Ok(Self::Unbounded);
        }
        Duration::try_from_secs_f64(1.0 / qps)
            .ok()
            .filter(|interval| *interval <= MAX_TICK_INTERVAL)
            .map(Self::Every)
            .ok_or(ConfigError::RateTooLow { value: qps })
    }
}

/// Everything one worker needs, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    pub pacing: Pacing,
    pub concurrency: NonZeroUsize,
    pub bad_every: Duration,
    pub extra_random_hits: usize,
    /// Leading-slash paths, possibly with a query string.
    pub exploratory_paths: Vec<String>,
    pub report_every: Duration,
    pub read_response_body: bool,
    pub bad_modes: Vec<String>,
    pub timeouts: RequestTimeouts,
}

/// Validated run: which workers to start and how each one behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub targets: Vec<Target>,
    pub processes_per_target: NonZeroUsize,
    pub worker: WorkerSettings,
}

impl RunPlan {
    #[must_use]
    pub fn total_workers(&self) -> usize {
        self.targets
            .len()
            .saturating_mul(self.processes_per_target.get())
    }
}

impl WorkloadConfig {
    /// Validates the whole config before any worker starts.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed targets or paths, a zero concurrency
    /// limit, or an unusable rate.
    pub fn resolve(&self, timeouts: RequestTimeouts) -> Result<RunPlan, ConfigError> {
        let worker = self.worker_settings(timeouts)?;
        let targets = self.resolve_targets()?;

        for target in &targets {
            for path in &worker.exploratory_paths {
                target
                    .join(path)
                    .map_err(|source| ConfigError::InvalidPath {
                        path: path.clone(),
                        source,
                    })?;
            }
        }

        Ok(RunPlan {
            targets,
            processes_per_target: self.effective_processes_per_target(),
            worker,
        })
    }

    /// Settings shared by every worker of this config.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero concurrency limit or an unusable rate.
    pub fn worker_settings(&self, timeouts: RequestTimeouts) -> Result<WorkerSettings, ConfigError> {
        let concurrency =
            NonZeroUsize::new(self.async_concurrency).ok_or(ConfigError::ConcurrencyZero)?;
        let pacing = Pacing::from_qps(self.qps_per_process)?;

        let exploratory_paths = if self.random_url_paths.is_empty() {
            DEFAULT_RANDOM_URL_PATHS
                .iter()
                .map(|path| normalize_path(path))
                .collect()
        } else {
            self.random_url_paths
                .iter()
                .map(|path| normalize_path(path))
                .collect()
        };

        let bad_modes = self
            .bad_modes
            .iter()
            .map(|mode| mode.trim())
            .filter(|mode| !mode.is_empty())
            .map(str::to_owned)
            .collect();

        Ok(WorkerSettings {
            pacing,
            concurrency,
            bad_every: Duration::from_secs(self.bad_every_seconds),
            extra_random_hits: self.extra_random_hits,
            exploratory_paths,
            report_every: Duration::from_secs(self.report_every_seconds).max(MIN_REPORT_INTERVAL),
            read_response_body: self.read_response_body,
            bad_modes,
            timeouts,
        })
    }

    /// Normalizes the configured targets, falling back to the default target
    /// when the list is empty.
    ///
    /// # Errors
    ///
    /// Returns the first target that fails to normalize.
    pub fn resolve_targets(&self) -> Result<Vec<Target>, ConfigError> {
        if self.targets.is_empty() {
            return Ok(vec![Target::parse(DEFAULT_TARGET, &self.scheme)?]);
        }
        self.targets
            .iter()
            .map(|raw| Target::parse(raw, &self.scheme))
            .collect()
    }

    #[must_use]
    pub fn effective_processes_per_target(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.processes_per_target).unwrap_or_else(logical_cpus)
    }
}

fn logical_cpus() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}
