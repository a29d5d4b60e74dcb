//! Workload configuration: loading, target normalization and validation.
mod loader;
mod plan;
mod target;
pub mod types;


pub use loader::{LoadedConfig, load_or_create_config};
pub use plan::{Pacing, RunPlan, WorkerSettings};
pub use target::Target;
pub use types::{RequestTimeouts, WorkloadConfig};
