use thiserror::Error;

#[derive(Debug, Error)]
pub enum FanoutError {
    #[error("Failed to locate the current executable: {source}")]
    CurrentExe {
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to spawn worker {index} for {target}: {source}")]
    SpawnWorker {
        index: usize,
        target: String,
        #[source]
        source: std::io::Error,
    },
    #[error("All {count} workers failed.")]
    AllWorkersFailed { count: usize },
}
