use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::Client;
use tracing::debug;

use crate::metrics::Stats;

use super::workload::RequestSpec;

/// How one request attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Response with a 2xx/3xx status.
    Success { status: u16 },
    /// Response with any other status.
    BadStatus { status: u16 },
    /// The per-request timeout elapsed.
    TimedOut,
    /// Connection refused/reset, DNS failure, broken body stream, ...
    TransportError,
}

impl RequestOutcome {
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        if status >= 200 && status < 400 {
            Self::Success { status }
        } else {
            Self::BadStatus { status }
        }
    }

    #[must_use]
    pub const fn from_error(timed_out: bool) -> Self {
        if timed_out {
            Self::TimedOut
        } else {
            Self::TransportError
        }
    }
}

/// Issues requests on a shared pool and folds every outcome into the
/// worker's stats. Never returns an error: failures are statistics.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
    stats: Arc<Stats>,
    read_body: bool,
}

impl RequestExecutor {
    #[must_use]
    pub const fn new(client: Client, stats: Arc<Stats>, read_body: bool) -> Self {
        Self {
            client,
            stats,
            read_body,
        }
    }

    pub async fn execute(&self, spec: RequestSpec) -> RequestOutcome {
        let kind = spec.kind;
        let outcome = match self.send(spec).await {
            Ok(status) => RequestOutcome::from_status(status),
            Err(err) => {
                debug!("{:?} request failed: {}", kind, err);
                RequestOutcome::from_error(err.is_timeout())
            }
        };
        self.stats.record(outcome);
        outcome
    }

    async fn send(&self, spec: RequestSpec) -> Result<u16, reqwest::Error> {
        let mut builder = self
            .client
            .request(spec.method, spec.url)
            .timeout(spec.timeout);
        if let Some(form) = spec.form.as_ref() {
            builder = builder.form(form);
        }
        let response = builder.send().await?;
        let status = response.status().as_u16();
        if self.read_body {
            drain_response_body(response).await?;
        } else {
            // Dropped unread: the connection is closed, not pooled.
            drop(response);
        }
        Ok(status)
    }
}

async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}
