//! Time-bounded cache for loaded tables.
//!
//! Values are handed out as `Arc<V>` so every reader shares one immutable copy.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// How long a loaded table stays fresh by default.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct Entry<V> {
    value: Arc<V>,
    loaded_at: Instant,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value for `key`, if it is younger than the TTL.
    pub async fn get(&self, key: &K) -> Option<Arc<V>> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|e| e.loaded_at.elapsed() < self.ttl)
            .map(|e| Arc::clone(&e.value))
    }

    pub async fn insert(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let mut entries = self.entries.lock().await;
        entries.insert(
            key,
            Entry {
                value: Arc::clone(&value),
                loaded_at: Instant::now(),
            },
        );
        value
    }

    pub async fn invalidate(&self, key: &K) {
        self.entries.lock().await.remove(key);
    }

    /// Returns the fresh cached value or runs `load` and caches its result.
    ///
    /// The lock is held across `load`, so concurrent callers for a cold key
    /// wait for one load instead of each fetching. Errors are not cached.
    pub async fn get_or_try_load<F, Fut, E>(&self, key: &K, load: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get(key) {
            if entry.loaded_at.elapsed() < self.ttl {
                debug!("Cache hit");
                return Ok(Arc::clone(&entry.value));
            }
        }

        debug!("Cache miss");
        let value = Arc::new(load().await?);
        entries.insert(
            key.clone(),
            Entry {
                value: Arc::clone(&value),
                loaded_at: Instant::now(),
            },
        );
        Ok(value)
    }
}
