//! Request pacing, admission control, workload mixing and execution.
mod client;
mod execution;
mod gate;
mod rate;
mod workload;


pub use client::build_client;
pub use execution::{RequestExecutor, RequestOutcome};
pub use gate::{Admission, ConcurrencyGate};
pub use rate::RateGate;
pub use workload::{Endpoints, MixPolicy, RequestKind, RequestSpec, WorkloadMixer};
