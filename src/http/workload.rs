use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use reqwest::Method;
use tokio::time::Instant;
use url::Url;

use crate::config::{RequestTimeouts, Target, WorkerSettings};
use crate::error::HttpError;

/// Search terms for product listings; the empty term lists everything.
pub(crate) const PRODUCT_QUERIES: [&str; 8] = ["", "a", "e", "lo", "ip", "alpha", "beta", "gamma"];
pub(crate) const PAGE_SIZES: [u32; 3] = [10, 20, 50];
/// Exploratory paths under this prefix get the expensive timeout.
pub(crate) const EXPENSIVE_PATH_PREFIX: &str = "/api/bad";

const PRODUCTS_PATH: &str = "/api/products";
const ORDERS_PATH: &str = "/api/orders";
const CREATE_ORDER_PATH: &str = "/api/order";

/// Cumulative upper bounds of the primary request draw.
const LIST_PRODUCTS_SHARE: f64 = 0.60;
const LIST_ORDERS_SHARE: f64 = 0.85;

const MAX_CUSTOMER_ID: u32 = 999;
const MAX_PRODUCT_ID: u32 = 5_000;
const MAX_ORDER_QTY: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    ListProducts,
    ListOrders,
    CreateOrder,
    /// Periodically injected slow request.
    Expensive,
    Exploratory,
}

/// One planned HTTP call.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub kind: RequestKind,
    pub method: Method,
    pub url: Url,
    /// Form-encoded body, if any.
    pub form: Option<Vec<(&'static str, String)>>,
    pub timeout: Duration,
}

impl RequestSpec {
    fn get(kind: RequestKind, url: Url, timeout: Duration) -> Self {
        Self {
            kind,
            method: Method::GET,
            url,
            form: None,
            timeout,
        }
    }

    #[must_use]
    pub fn is_expensive(&self) -> bool {
        self.kind == RequestKind::Expensive
    }
}

#[derive(Debug, Clone)]
struct ExploratoryUrl {
    url: Url,
    expensive: bool,
}

/// URLs of one target, resolved once per worker.
#[derive(Debug, Clone)]
pub struct Endpoints {
    products: Url,
    orders: Url,
    create_order: Url,
    expensive: Url,
    exploratory: Vec<ExploratoryUrl>,
}

impl Endpoints {
    /// Resolves the fixed surface plus the exploratory paths against `target`.
    ///
    /// # Errors
    ///
    /// Returns an error when a path cannot be joined onto the target.
    pub fn for_target(target: &Target, exploratory_paths: &[String]) -> Result<Self, HttpError> {
        let join = |path: &str| {
            target.join(path).map_err(|source| HttpError::JoinUrlFailed {
                url: format!("{}{}", target, path),
                source,
            })
        };

        let exploratory = exploratory_paths
            .iter()
            .map(|path| -> Result<ExploratoryUrl, HttpError> {
                Ok(ExploratoryUrl {
                    url: join(path.as_str())?,
                    expensive: path.trim().starts_with(EXPENSIVE_PATH_PREFIX),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            products: join(PRODUCTS_PATH)?,
            orders: join(ORDERS_PATH)?,
            create_order: join(CREATE_ORDER_PATH)?,
            expensive: join(EXPENSIVE_PATH_PREFIX)?,
            exploratory,
        })
    }
}

/// Knobs of the mixer that come from the workload config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixPolicy {
    pub bad_every: Duration,
    pub extra_random_hits: usize,
    pub bad_modes: Vec<String>,
    pub timeouts: RequestTimeouts,
}

impl From<&WorkerSettings> for MixPolicy {
    fn from(settings: &WorkerSettings) -> Self {
        Self {
            bad_every: settings.bad_every,
            extra_random_hits: settings.extra_random_hits,
            bad_modes: settings.bad_modes.clone(),
            timeouts: settings.timeouts,
        }
    }
}

/// Builds the batch of requests issued on each tick.
#[derive(Debug)]
pub struct WorkloadMixer<R = StdRng> {
    endpoints: Endpoints,
    policy: MixPolicy,
    last_expensive: Option<Instant>,
    rng: R,
}

impl WorkloadMixer<StdRng> {
    #[must_use]
    pub fn new(endpoints: Endpoints, policy: MixPolicy) -> Self {
        Self::with_rng(endpoints, policy, StdRng::from_entropy())
    }
}

impl<R: Rng> WorkloadMixer<R> {
    pub const fn with_rng(endpoints: Endpoints, policy: MixPolicy, rng: R) -> Self {
        Self {
            endpoints,
            policy,
            last_expensive: None,
            rng,
        }
    }

    /// One primary request, an expensive request when its interval has
    /// elapsed since the previous one, then the exploratory hits.
    pub fn next_batch(&mut self, now: Instant) -> Vec<RequestSpec> {
        let mut batch = Vec::with_capacity(self.policy.extra_random_hits.saturating_add(2));
        batch.push(self.primary_request());

        if self.expensive_due(now) {
            self.last_expensive = Some(now);
            batch.push(self.expensive_request());
        }

        for _ in 0..self.policy.extra_random_hits {
            if let Some(spec) = self.exploratory_request() {
                batch.push(spec);
            }
        }
        batch
    }

    fn expensive_due(&self, now: Instant) -> bool {
        self.last_expensive
            .is_none_or(|last| now.saturating_duration_since(last) >= self.policy.bad_every)
    }

    fn primary_request(&mut self) -> RequestSpec {
        let timeout = self.policy.timeouts.normal;
        let draw: f64 = self.rng.gen_range(0.0..1.0);
        if draw < LIST_PRODUCTS_SHARE {
            let query = PRODUCT_QUERIES.choose(&mut self.rng).copied().unwrap_or_default();
            let limit = PAGE_SIZES.choose(&mut self.rng).copied().unwrap_or(20);
            let mut url = self.endpoints.products.clone();
            url.query_pairs_mut()
                .append_pair("q", query)
                .append_pair("limit", &limit.to_string());
            RequestSpec::get(RequestKind::ListProducts, url, timeout)
        } else if draw < LIST_ORDERS_SHARE {
            RequestSpec::get(RequestKind::ListOrders, self.endpoints.orders.clone(), timeout)
        } else {
            let customer = self.rng.gen_range(1..=MAX_CUSTOMER_ID);
            let product = self.rng.gen_range(1..=MAX_PRODUCT_ID);
            let qty = self.rng.gen_range(1..=MAX_ORDER_QTY);
            RequestSpec {
                kind: RequestKind::CreateOrder,
                method: Method::POST,
                url: self.endpoints.create_order.clone(),
                form: Some(vec![
                    ("customer_email", format!("user{}@example.com", customer)),
                    ("product_id", product.to_string()),
                    ("qty", qty.to_string()),
                ]),
                timeout,
            }
        }
    }

    fn expensive_request(&mut self) -> RequestSpec {
        let mut url = self.endpoints.expensive.clone();
        if let Some(mode) = self.policy.bad_modes.choose(&mut self.rng) {
            url.query_pairs_mut().append_pair("mode", mode);
        }
        RequestSpec::get(RequestKind::Expensive, url, self.policy.timeouts.expensive)
    }

    fn exploratory_request(&mut self) -> Option<RequestSpec> {
        let target = self.endpoints.exploratory.choose(&mut self.rng)?;
        let timeout = if target.expensive {
            self.policy.timeouts.expensive
        } else {
            self.policy.timeouts.normal
        };
        Some(RequestSpec::get(
            RequestKind::Exploratory,
            target.url.clone(),
            timeout,
        ))
    }
}
