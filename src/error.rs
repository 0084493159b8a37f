use std::fmt::{Debug, Display, Formatter, Result};
use std::io;
use std::num::ParseIntError;

#[derive(Debug)]
pub enum CacheError {
    ZeroCapacity,
    InvalidCapacity(ParseIntError),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            CacheError::ZeroCapacity => write!(f, "no capacity allocated to the cache"),
            CacheError::InvalidCapacity(err) => {
                write!(f, "cannot parse cache capacity: {}", err)
            }
        }
    }
}

// Allow the error to be used with ?
impl std::error::Error for CacheError {}

impl From<ParseIntError> for CacheError {
    fn from(value: ParseIntError) -> Self {
        CacheError::InvalidCapacity(value)
    }
}

#[derive(Debug)]
pub enum ResolveError {
    NoAddress(String),
    Lookup(io::Error),
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            ResolveError::NoAddress(name) => write!(f, "no address found for {}", name),
            ResolveError::Lookup(err) => write!(f, "upstream lookup failed: {}", err),
        }
    }
}

impl std::error::Error for ResolveError {}

// Convert io::Error to ResolveError::Lookup
impl From<io::Error> for ResolveError {
    fn from(err: io::Error) -> Self {
        ResolveError::Lookup(err)
    }
}
