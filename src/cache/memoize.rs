//! Memoized Wrapper
//!
//! Binds a computation, its identity and a TTL to a cache, producing a callable with
//! cache-aside behavior attached.

use std::future::Future;

use serde::{de::DeserializeOwned, Serialize};

use crate::cache::MemoCache;
use crate::error::CacheError;

/// A computation wrapped by [`MemoCache::memoize`].
///
/// `call(args)` returns what `func(args)` would, served from the cache while the stored
/// result is unexpired.
pub struct Memoized<F> {
    cache: MemoCache,
    identity: String,
    ttl_seconds: u64,
    func: F,
}

impl<F> Memoized<F> {
    pub(crate) fn new(cache: MemoCache, identity: String, ttl_seconds: u64, func: F) -> Self {
        Self {
            cache,
            identity,
            ttl_seconds,
            func,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Invokes the wrapped computation through the cache.
    pub async fn call<A, T, E, Fut>(&self, args: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut,
        A: Serialize,
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = self.cache.derive_key(&self.identity, &args)?;
        self.cache
            .resolve(&key, self.ttl_seconds, || (self.func)(args))
            .await
    }
}

impl<F> std::fmt::Debug for Memoized<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoized")
            .field("identity", &self.identity)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}
