mod cache;
mod lru;

pub use cache::DnsCache;

use crate::error::CacheError;
use std::env;
use std::sync::Arc;

/// Capacity used when neither the caller nor the environment sets one.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Environment variable read by `CacheBuilder::from_env`.
pub const CAPACITY_ENV_VAR: &str = "DNSCACHE_CAPACITY";

/// parse_capacity reads a capacity from text, as found in the environment or on a command line.
pub fn parse_capacity(raw: &str) -> Result<usize, CacheError> {
    let capacity: usize = raw.trim().parse()?;
    if capacity == 0 {
        return Err(CacheError::ZeroCapacity);
    }
    Ok(capacity)
}

/// CacheBuilder is a struct used to build a cache.
/// # Example
///
/// ```
/// use dnscache::db::CacheBuilder;
///
/// let cache = CacheBuilder::new().with_capacity(128).build().unwrap();
/// assert_eq!(cache.capacity(), 128);
/// ```
#[derive(Debug, Default)]
pub struct CacheBuilder {
    capacity: Option<usize>,
}

impl CacheBuilder {
    pub fn new() -> Self {
        CacheBuilder { capacity: None }
    }

    /// from_env starts a builder with the capacity found in `DNSCACHE_CAPACITY`, if any.
    pub fn from_env() -> Result<Self, CacheError> {
        Self::from_var(CAPACITY_ENV_VAR)
    }

    fn from_var(var: &str) -> Result<Self, CacheError> {
        let capacity = match env::var(var) {
            Ok(raw) => Some(parse_capacity(&raw)?),
            Err(_) => None,
        };
        Ok(CacheBuilder { capacity })
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity.unwrap_or(DEFAULT_CAPACITY)
    }

    pub fn build(self) -> Result<DnsCache, CacheError> {
        DnsCache::new(self.capacity())
    }

    /// build_shared builds the cache behind an `Arc`, ready to be handed to several owners.
    pub fn build_shared(self) -> Result<Arc<DnsCache>, CacheError> {
        self.build().map(Arc::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default_capacity() {
        let cache = CacheBuilder::new().build().unwrap();
        assert_eq!(cache.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_builder_rejects_zero() {
        let result = CacheBuilder::new().with_capacity(0).build();
        assert!(matches!(result, Err(CacheError::ZeroCapacity)));
    }

    #[test]
    fn test_build_shared() {
        let cache = CacheBuilder::new().with_capacity(3).build_shared().unwrap();
        let other = Arc::clone(&cache);
        other.update("example.com", "93.184.216.34");
        assert_eq!(cache.resolve("example.com").unwrap(), "93.184.216.34");
    }

    #[test]
    fn test_parse_capacity() {
        assert_eq!(parse_capacity("500").unwrap(), 500);
        assert_eq!(parse_capacity(" 42\n").unwrap(), 42);
        assert!(matches!(parse_capacity("0"), Err(CacheError::ZeroCapacity)));
        assert!(matches!(
            parse_capacity("-3"),
            Err(CacheError::InvalidCapacity(_))
        ));
        assert!(matches!(
            parse_capacity("lots"),
            Err(CacheError::InvalidCapacity(_))
        ));
    }

    #[test]
    fn test_builder_from_env() {
        env::set_var("DNSCACHE_TEST_CAPACITY_SET", "256");
        let cache = CacheBuilder::from_var("DNSCACHE_TEST_CAPACITY_SET")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(cache.capacity(), 256);

        let builder = CacheBuilder::from_var("DNSCACHE_TEST_CAPACITY_UNSET").unwrap();
        assert_eq!(builder.capacity(), DEFAULT_CAPACITY);

        env::set_var("DNSCACHE_TEST_CAPACITY_BAD", "plenty");
        assert!(matches!(
            CacheBuilder::from_var("DNSCACHE_TEST_CAPACITY_BAD"),
            Err(CacheError::InvalidCapacity(_))
        ));

        env::set_var("DNSCACHE_TEST_CAPACITY_ZERO", "0");
        assert!(matches!(
            CacheBuilder::from_var("DNSCACHE_TEST_CAPACITY_ZERO"),
            Err(CacheError::ZeroCapacity)
        ));
    }
}
