use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Takes precedence over `RUST_LOG`.
const LOG_ENV: &str = "LOADMIX_LOG";
const FALLBACK_DIRECTIVE: &str = "info";

/// Installs the global subscriber. Children inherit the environment, so every
/// worker process ends up with the supervisor's filter.
pub fn init_logging(verbose: bool, no_color: bool) {
    let loadmix_log = std::env::var(LOG_ENV).ok();
    let rust_log = std::env::var("RUST_LOG").ok();
    let directive = filter_directive(loadmix_log.as_deref(), rust_log.as_deref(), verbose);
    let filter =
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(FALLBACK_DIRECTIVE));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(!no_color)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

/// First non-blank of `LOADMIX_LOG`, `RUST_LOG`, then the `--verbose` level.
fn filter_directive<'env>(
    loadmix_log: Option<&'env str>,
    rust_log: Option<&'env str>,
    verbose: bool,
) -> &'env str {
    [loadmix_log, rust_log]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(if verbose { "debug" } else { FALLBACK_DIRECTIVE })
}
