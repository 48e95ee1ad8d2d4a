//! Memoizing async cache with single-flight semantics.
//!
//! [`IdentityCache::get_or_create`] runs the factory for a key at most once
//! among all callers that arrive while it is in flight. Every waiter sees
//! the same value or the same error. Errors are never stored: the next call
//! after a failure runs the factory again.

use crate::{Error, Result};
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// How long an entry stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Entries never expire on their own.
    Never,
    /// Entries expire when not accessed for the given duration.
    Sliding(Duration),
    /// Entries expire the given duration after creation.
    Absolute(Duration),
}

impl Expiration {
    /// Pick an expiry policy from optional sliding and absolute windows.
    /// Sliding wins when both are set.
    pub fn from_windows(sliding: Option<Duration>, absolute: Option<Duration>) -> Self {
        match (sliding, absolute) {
            (Some(d), _) => Expiration::Sliding(d),
            (None, Some(d)) => Expiration::Absolute(d),
            (None, None) => Expiration::Never,
        }
    }
}

struct CacheEntry<V> {
    value: V,
    created: Instant,
    last_accessed: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        let now = Instant::now();
        Self {
            value,
            created: now,
            last_accessed: now,
        }
    }

    fn is_expired(&self, expiration: Expiration, now: Instant) -> bool {
        match expiration {
            Expiration::Never => false,
            Expiration::Sliding(ttl) => now.duration_since(self.last_accessed) >= ttl,
            Expiration::Absolute(ttl) => now.duration_since(self.created) >= ttl,
        }
    }
}

type Pending<V> = Shared<BoxFuture<'static, std::result::Result<V, Arc<Error>>>>;

struct Inner<K, V> {
    name: &'static str,
    entries: DashMap<K, CacheEntry<V>>,
    pending: DashMap<K, (u64, Pending<V>)>,
    tickets: AtomicU64,
    generation: AtomicU64,
    expiration: Expiration,
}

/// Thread-safe, single-flight async cache.
pub struct IdentityCache<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for IdentityCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> IdentityCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a new cache. The name only shows up in logs.
    pub fn new(name: &'static str, expiration: Expiration) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                entries: DashMap::new(),
                pending: DashMap::new(),
                tickets: AtomicU64::new(0),
                generation: AtomicU64::new(0),
                expiration,
            }),
        }
    }

    /// Get a cached value without computing anything.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        if let Some(mut entry) = self.inner.entries.get_mut(key) {
            if !entry.is_expired(self.inner.expiration, now) {
                entry.last_accessed = now;
                return Some(entry.value.clone());
            }
        } else {
            return None;
        }

        // Stale; only drop it if nobody refreshed it in the meantime.
        let expiration = self.inner.expiration;
        self.inner
            .entries
            .remove_if(key, |_, entry| entry.is_expired(expiration, now));
        None
    }

    /// Get a value, running `factory` to create it when missing.
    pub async fn get_or_create<F, Fut>(&self, key: K, factory: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        self.get_or_create_with(key, factory, |_| {}).await
    }

    /// Like [`get_or_create`](Self::get_or_create), calling `on_existing`
    /// when the value was already cached.
    ///
    /// `factory` is called while the key's pending slot is reserved, so it
    /// must only build the future and not touch this cache itself.
    pub async fn get_or_create_with<F, Fut, H>(&self, key: K, factory: F, on_existing: H) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
        H: FnOnce(&V),
    {
        if let Some(value) = self.get(&key) {
            tracing::trace!("{} cache hit for {:?}", self.inner.name, key);
            on_existing(&value);
            return Ok(value);
        }

        let pending = match self.inner.pending.entry(key.clone()) {
            MapEntry::Occupied(slot) => {
                tracing::trace!("{} joining in-flight computation for {:?}", self.inner.name, key);
                slot.get().1.clone()
            }
            MapEntry::Vacant(slot) => {
                // A computation may have finished between the lookup and here.
                if let Some(value) = self.get(&key) {
                    drop(slot);
                    on_existing(&value);
                    return Ok(value);
                }

                tracing::debug!("{} cache miss for {:?}", self.inner.name, key);
                let ticket = self.inner.tickets.fetch_add(1, Ordering::Relaxed);
                let generation = self.inner.generation.load(Ordering::Acquire);
                let shared = complete(
                    Arc::downgrade(&self.inner),
                    key.clone(),
                    ticket,
                    generation,
                    factory(),
                )
                .boxed()
                .shared();
                slot.insert((ticket, shared.clone()));
                shared
            }
        };

        pending.await.map_err(Error::from)
    }

    /// Insert a value directly.
    pub fn insert(&self, key: K, value: V) {
        self.inner.entries.insert(key, CacheEntry::new(value));
    }

    /// Remove a single entry.
    pub fn remove(&self, key: &K) {
        self.inner.entries.remove(key);
    }

    /// Remove all entries.
    ///
    /// Computations still in flight finish for their current waiters, but
    /// their results are not stored.
    pub fn clear(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.pending.clear();
        self.inner.entries.clear();
        tracing::debug!("{} cache cleared", self.inner.name);
    }

    /// Remove expired entries.
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        let expiration = self.inner.expiration;
        self.inner
            .entries
            .retain(|_, entry| !entry.is_expired(expiration, now));
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }
}

async fn complete<K, V, Fut>(
    inner: Weak<Inner<K, V>>,
    key: K,
    ticket: u64,
    generation: u64,
    fut: Fut,
) -> std::result::Result<V, Arc<Error>>
where
    K: Eq + Hash + Clone,
    V: Clone,
    Fut: Future<Output = Result<V>>,
{
    let result = fut.await.map_err(Arc::new);
    if let Some(inner) = inner.upgrade() {
        if let Ok(value) = &result {
            if inner.generation.load(Ordering::Acquire) == generation {
                inner.entries.insert(key.clone(), CacheEntry::new(value.clone()));
            }
        }
        inner.pending.remove_if(&key, |_, (t, _)| *t == ticket);
    }
    result
}
