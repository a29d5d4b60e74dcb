use std::num::NonZeroUsize;

use reqwest::Client;

use crate::args::DEFAULT_USER_AGENT;
use crate::error::HttpError;

/// Builds the connection pool shared by every request of one worker. Timeouts
/// are set per request, so the client itself has none.
///
/// # Errors
///
/// Returns an error when the TLS backend or resolver cannot be initialized.
pub fn build_client(concurrency: NonZeroUsize) -> Result<Client, HttpError> {
    Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .pool_max_idle_per_host(concurrency.get())
        .build()
        .map_err(|source| HttpError::BuildClientFailed { source })
}
