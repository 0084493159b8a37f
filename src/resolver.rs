//! Resolution front end that consults a shared `DnsCache` before asking an upstream.

use crate::db::DnsCache;
use crate::error::ResolveError;
use metrics::{counter, describe_counter};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::{debug, error};

const METRIC_UPSTREAM_ERRORS: &str = "dnscache_upstream_errors_total";
const METRIC_UPSTREAM_ERRORS_DESC: &str = "number of failed upstream lookups";

/// Upstream is whatever actually turns a hostname into an address on a cache miss.
#[allow(async_fn_in_trait)]
pub trait Upstream {
    /// lookup returns one address for name.
    async fn lookup(&self, name: &str) -> Result<String, ResolveError>;
}

/// SystemUpstream asks the operating system resolver and keeps the first address it returns.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemUpstream;

impl Upstream for SystemUpstream {
    async fn lookup(&self, name: &str) -> Result<String, ResolveError> {
        let mut addresses = tokio::net::lookup_host((name, 0)).await?;
        addresses
            .next()
            .map(|address| address.ip().to_string())
            .ok_or_else(|| ResolveError::NoAddress(name.to_string()))
    }
}

/// Resolved tells where an address came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Cached(String),
    Upstream(String),
}

impl Resolved {
    pub fn address(&self) -> &str {
        match self {
            Resolved::Cached(address) | Resolved::Upstream(address) => address.as_str(),
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Resolved::Cached(_))
    }
}

/// CachedResolver answers from the shared cache when it can and otherwise queries its upstream,
/// storing the answer for the next caller.
///
/// The cache is injected rather than global. Build every resolver that should share entries
/// over the same `Arc<DnsCache>`.
pub struct CachedResolver<U> {
    cache: Arc<DnsCache>,
    upstream: U,
}

impl<U: Upstream> CachedResolver<U> {
    pub fn new(cache: Arc<DnsCache>, upstream: U) -> Self {
        describe_counter!(METRIC_UPSTREAM_ERRORS, METRIC_UPSTREAM_ERRORS_DESC);
        Self { cache, upstream }
    }

    /// cache returns the shared cache this resolver reads from and writes to.
    pub fn cache(&self) -> Arc<DnsCache> {
        Arc::clone(&self.cache)
    }

    /// lookup resolves name, going upstream only on a cache miss.
    ///
    /// The cache lock is never held across the upstream call. Two concurrent misses on the
    /// same name may therefore both go upstream, and the later answer wins.
    /// Failed lookups are not cached.
    pub async fn lookup(&self, name: &str) -> Result<Resolved, ResolveError> {
        if let Some(address) = self.cache.resolve(name) {
            debug!(host = %name, %address, "cache hit");
            return Ok(Resolved::Cached(address));
        }

        debug!(host = %name, "cache miss, querying upstream");
        let address = match self.upstream.lookup(name).await {
            Ok(address) => address,
            Err(e) => {
                counter!(METRIC_UPSTREAM_ERRORS).increment(1);
                error!(host = %name, "upstream lookup failed: {}", e);
                return Err(e);
            }
        };

        self.cache.update(name, &address);
        debug!(host = %name, %address, cached = self.cache.len(), "stored upstream answer");
        Ok(Resolved::Upstream(address))
    }
}

impl<U> Debug for CachedResolver<U> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "CachedResolver{{cache: {:?}}}", self.cache)
    }
}
