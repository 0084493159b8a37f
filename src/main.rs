use dnscache::db::{parse_capacity, CacheBuilder};
use dnscache::error::CacheError;
use dnscache::resolver::{CachedResolver, SystemUpstream};
use std::error::Error;
use std::process;
use tracing::{error, info, Level};

const USAGE: &str = "usage: dnscache [--capacity N] <host>...";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    if let Err(e) = run().await {
        error!("{}", e);
        process::exit(1);
    }
}

/// cache_builder prefers the capacity given on the command line and only reads the
/// environment when there is none.
fn cache_builder(capacity: Option<usize>) -> Result<CacheBuilder, CacheError> {
    match capacity {
        Some(capacity) => Ok(CacheBuilder::new().with_capacity(capacity)),
        None => CacheBuilder::from_env(),
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let mut capacity = None;
    let mut hosts = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--capacity" => {
                let raw = args.next().ok_or(USAGE)?;
                capacity = Some(parse_capacity(&raw)?);
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ => hosts.push(arg),
        }
    }
    if hosts.is_empty() {
        return Err(USAGE.into());
    }

    let cache = cache_builder(capacity)?.build_shared()?;
    info!(capacity = cache.capacity(), "dns cache ready");
    let resolver = CachedResolver::new(cache, SystemUpstream);

    // every host is looked up twice, the second answer should come from the cache
    for _ in 0..2 {
        for host in &hosts {
            match resolver.lookup(host).await {
                Ok(resolved) => {
                    let source = if resolved.is_cached() {
                        "cached"
                    } else {
                        "upstream"
                    };
                    println!("{} {} ({})", host, resolved.address(), source);
                }
                Err(e) => println!("{} error: {}", host, e),
            }
        }
    }

    info!(entries = resolver.cache().len(), "done");
    Ok(())
}
