//! In-memory cache for completed city analyses.
//!
//! Avoids repeating the full external pipeline when the same city is
//! requested twice within the TTL. Keys are the normalized city name, so
//! only same-spelling requests hit ("New York" and "new york" share a key,
//! "New York" and "New York City" do not). Only successful analyses are
//! stored; a failing city re-attempts the pipeline on every request.
//!
//! Concurrent misses for one key are coalesced: the first caller runs the
//! pipeline while the rest wait on a per-key lock and then re-read the
//! freshly stored entry.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::CityAnalysis;
use dashmap::DashMap;
use tokio::sync::Mutex;

/// Default time-to-live for cached analyses.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Cache key: lowercase, spaces as underscores. No punctuation or accent
/// folding, matching the upstream lookup behavior.
pub fn cache_key(city: &str) -> String {
    city.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// A timestamped snapshot of a successful analysis.
#[derive(Clone, Debug)]
struct CacheEntry {
    analysis: CityAnalysis,
    inserted_at: Instant,
}

/// Thread-safe analysis cache with per-key request coalescing.
pub struct AnalysisCache {
    entries: DashMap<String, CacheEntry>,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl AnalysisCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a live cached analysis for a city.
    ///
    /// Expired entries are removed lazily and count as misses.
    pub fn get(&self, city: &str) -> Option<CityAnalysis> {
        let key = cache_key(city);

        let entry = match self.entries.get(&key) {
            Some(e) => e,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if entry.inserted_at.elapsed() > self.ttl {
            drop(entry);
            self.entries.remove(&key);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.analysis.clone())
    }

    /// Store a successful analysis, overwriting any prior entry for the
    /// key. Error outcomes must never be passed here.
    pub fn insert(&self, city: &str, analysis: &CityAnalysis) {
        self.entries.insert(
            cache_key(city),
            CacheEntry {
                analysis: analysis.clone(),
                inserted_at: Instant::now(),
            },
        );
    }

    /// Cached lookup with single-flight computation.
    ///
    /// On a miss the first caller runs `compute`; concurrent callers for
    /// the same key wait and then read the stored result instead of
    /// duplicating the external work. Failures are returned to every
    /// waiter that reaches `compute` and are never cached.
    pub async fn get_or_try_compute<F, Fut, E>(
        &self,
        city: &str,
        compute: F,
    ) -> Result<CityAnalysis, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CityAnalysis, E>>,
    {
        if let Some(hit) = self.get(city) {
            return Ok(hit);
        }

        let key = cache_key(city);
        let lock = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock().await;

        // A coalesced caller finds the entry the first caller stored.
        if let Some(hit) = self.get(city) {
            return Ok(hit);
        }

        let result = compute().await;
        if let Ok(ref analysis) = result {
            self.insert(city, analysis);
        }

        drop(guard);
        self.in_flight.remove(&key);
        result
    }

    /// Number of cache hits since creation.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of cache misses since creation.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of live entries (expired ones may still be counted until
    /// their next lookup).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for AnalysisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisCache")
            .field("entries", &self.entries.len())
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn analysis(city: &str) -> CityAnalysis {
        let mut a = CityAnalysis::empty(city);
        a.population = Some(674_963);
        a.green_area_km2 = Some(42.5);
        a
    }

    #[test]
    fn key_normalization() {
        assert_eq!(cache_key("New York"), "new_york");
        assert_eq!(cache_key("new york"), "new_york");
        assert_eq!(cache_key(" Buenos   Aires "), "buenos_aires");
        assert_ne!(cache_key("New York"), cache_key("New York City"));
    }

    #[test]
    fn miss_on_empty() {
        let cache = AnalysisCache::default();
        assert!(cache.get("Helsinki").is_none());
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 0);
    }

    #[test]
    fn hit_after_insert_same_fields() {
        let cache = AnalysisCache::default();
        cache.insert("Helsinki", &analysis("Helsinki"));

        let cached = cache.get("Helsinki").expect("entry should be live");
        assert_eq!(cached.city, "Helsinki");
        assert_eq!(cached.population, Some(674_963));
        assert_eq!(cached.green_area_km2, Some(42.5));
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn differently_cased_names_share_a_key() {
        let cache = AnalysisCache::default();
        cache.insert("New York", &analysis("New York"));
        assert!(cache.get("new york").is_some());
        assert!(cache.get("New York City").is_none());
    }

    #[test]
    fn expired_entry_misses() {
        let cache = AnalysisCache::new(Duration::from_millis(1));
        cache.insert("Helsinki", &analysis("Helsinki"));
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get("Helsinki").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn compute_runs_once_per_key() {
        let cache = Arc::new(AnalysisCache::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let run = |cache: Arc<AnalysisCache>, calls: Arc<AtomicUsize>| async move {
            cache
                .get_or_try_compute("Helsinki", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok::<_, String>(analysis("Helsinki"))
                })
                .await
        };

        let (a, b) = tokio::join!(
            run(cache.clone(), calls.clone()),
            run(cache.clone(), calls.clone())
        );

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = AnalysisCache::default();

        let failed: Result<CityAnalysis, String> = cache
            .get_or_try_compute("Atlantis", || async { Err("no such place".to_string()) })
            .await;
        assert!(failed.is_err());
        assert!(cache.is_empty());

        // The next request retries the pipeline and can succeed.
        let ok = cache
            .get_or_try_compute("Atlantis", || async {
                Ok::<_, String>(analysis("Atlantis"))
            })
            .await;
        assert!(ok.is_ok());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn cached_hit_skips_compute() {
        let cache = AnalysisCache::default();
        cache.insert("Helsinki", &analysis("Helsinki"));

        let result: Result<CityAnalysis, String> = cache
            .get_or_try_compute("helsinki", || async {
                panic!("collaborators must not be re-invoked on a cache hit")
            })
            .await;
        assert_eq!(result.expect("hit").city, "Helsinki");
    }
}
