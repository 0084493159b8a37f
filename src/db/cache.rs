use crate::db::lru::Lru;
use crate::error::CacheError;
use metrics::{counter, describe_counter};
use std::fmt::{Debug, Formatter};
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const METRIC_HITS: &str = "dnscache_hits_total";
const METRIC_HITS_DESC: &str = "number of resolve calls answered from the cache";
const METRIC_MISSES: &str = "dnscache_misses_total";
const METRIC_MISSES_DESC: &str = "number of resolve calls for names absent from the cache";
const METRIC_EVICTIONS: &str = "dnscache_evictions_total";
const METRIC_EVICTIONS_DESC: &str = "number of entries evicted to stay within capacity";

/// DnsCache maps hostnames to addresses and keeps at most `capacity` of them, evicting the
/// least recently used one when a new name arrives on a full cache.
///
/// Both `update` and `resolve` reorder entries, so one mutex guards the index and the recency
/// list together and every call runs under it. Share a cache between threads or tasks by
/// wrapping it in an `Arc`.
///
/// # Example
///
/// ```
/// use dnscache::db::DnsCache;
///
/// let cache = DnsCache::new(2).unwrap();
/// cache.update("a.example", "10.0.0.1");
/// cache.update("b.example", "10.0.0.2");
/// cache.resolve("a.example");
/// cache.update("c.example", "10.0.0.3");
///
/// assert_eq!(cache.resolve("b.example"), None);
/// assert_eq!(cache.resolve("a.example").as_deref(), Some("10.0.0.1"));
/// ```
pub struct DnsCache {
    state: Mutex<Lru>,
    capacity: NonZeroUsize,
}

impl DnsCache {
    /// new creates a cache holding at most `capacity` entries. A zero capacity is rejected.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(CacheError::ZeroCapacity)?;
        Ok(Self::with_capacity(capacity))
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        describe_counter!(METRIC_HITS, METRIC_HITS_DESC);
        describe_counter!(METRIC_MISSES, METRIC_MISSES_DESC);
        describe_counter!(METRIC_EVICTIONS, METRIC_EVICTIONS_DESC);
        Self {
            state: Mutex::new(Lru::new(capacity)),
            capacity,
        }
    }

    /// update stores the address for name and marks it as the most recently used entry.
    /// When name is new and the cache is full, exactly one entry, the least recently used,
    /// is evicted first.
    pub fn update(&self, name: &str, address: &str) {
        let evicted = self.lock().insert(name, address);

        if let Some((evicted_name, _)) = evicted {
            counter!(METRIC_EVICTIONS).increment(1);
            debug!(
                evicted = %evicted_name,
                inserted = %name,
                capacity = self.capacity.get(),
                "evicted least recently used entry"
            );
        }
    }

    /// resolve returns the address cached for name, or `None` when it is absent.
    /// A hit counts as a use and moves the entry to the most recently used position.
    pub fn resolve(&self, name: &str) -> Option<String> {
        let address = self.lock().get(name).map(str::to_owned);
        match address {
            Some(_) => counter!(METRIC_HITS).increment(1),
            None => counter!(METRIC_MISSES).increment(1),
        }
        address
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// len returns the number of cached entries. It does not change their order.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A poisoned mutex means a holder panicked halfway through relinking the list.
    // The structure cannot be trusted after that, so we panic too.
    fn lock(&self) -> MutexGuard<'_, Lru> {
        self.state
            .lock()
            .expect("dns cache state poisoned by a panicking holder")
    }
}

impl Debug for DnsCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DnsCache{{capacity: {}}}", self.capacity)
    }
}
