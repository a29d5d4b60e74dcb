use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write default config '{path}': {source}")]
    WriteConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize default TOML config: {source}")]
    SerializeToml {
        #[source]
        source: toml::ser::Error,
    },
    #[error("Failed to serialize default JSON config: {source}")]
    SerializeJson {
        #[source]
        source: serde_json::Error,
    },
    #[error("Target must not be empty.")]
    EmptyTarget,
    #[error("Invalid target '{target}': {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Target '{target}' has no host.")]
    TargetMissingHost { target: String },
    #[error("Unsupported scheme '{scheme}' in target '{target}'. Use http or https.")]
    UnsupportedScheme { target: String, scheme: String },
    #[error("Config 'async_concurrency' must be >= 1.")]
    ConcurrencyZero,
    #[error("Config 'qps_per_process' must be a finite number, got {value}.")]
    RateNotFinite { value: f64 },
    #[error("Config 'qps_per_process' {value} is too low; one tick per hour is the minimum.")]
    RateTooLow { value: f64 },
    #[error("Invalid exploratory path '{path}': {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: url::ParseError,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
