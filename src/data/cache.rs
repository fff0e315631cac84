//! Sheet Cache Module
//! Time-to-live store for fetched sheets, keyed by source location.

use super::loader::{LoaderError, RawTable};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default time-to-live for a fetched sheet.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// A fetched sheet shared read-only between callers.
#[derive(Debug, Clone)]
pub struct CachedSheet {
    pub table: Arc<RawTable>,
    pub fetched_at: Instant,
}

impl CachedSheet {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// Caches raw sheets for a fixed time-to-live.
///
/// The lock is held while fetching, so concurrent callers inside the TTL window
/// all observe the same `Arc<RawTable>`. Failed fetches are not cached.
pub struct SheetCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedSheet>>,
}

impl Default for SheetCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl SheetCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CachedSheet>> {
        // A panic in another caller's fetch leaves the map itself intact
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return the cached sheet for `key`, fetching it when absent or expired.
    pub fn get_or_fetch<F>(&self, key: &str, fetch: F) -> Result<CachedSheet, LoaderError>
    where
        F: FnOnce() -> Result<RawTable, LoaderError>,
    {
        self.get_or_fetch_at(key, Instant::now(), fetch)
    }

    pub(crate) fn get_or_fetch_at<F>(
        &self,
        key: &str,
        now: Instant,
        fetch: F,
    ) -> Result<CachedSheet, LoaderError>
    where
        F: FnOnce() -> Result<RawTable, LoaderError>,
    {
        let mut entries = self.entries();

        if let Some(entry) = entries.get(key) {
            if entry.is_fresh(now, self.ttl) {
                debug!(key, "sheet cache hit");
                return Ok(entry.clone());
            }
        }

        let table = fetch()?;
        info!(key, rows = table.height(), "sheet cached");
        let entry = CachedSheet {
            table: Arc::new(table),
            fetched_at: now,
        };
        entries.insert(key.to_string(), entry.clone());
        Ok(entry)
    }

    /// Drop the entry so the next call refetches.
    pub fn invalidate(&self, key: &str) {
        if self.entries().remove(key).is_some() {
            debug!(key, "sheet cache invalidated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    fn table(rows: usize) -> RawTable {
        RawTable::new(
            vec!["Uke".into()],
            (0..rows).map(|i| vec![Some(i.to_string())]).collect(),
        )
    }

    #[test]
    fn serves_cached_table_within_ttl() {
        let cache = SheetCache::new(Duration::from_secs(600));
        let calls = Cell::new(0);
        let start = Instant::now();

        let first = cache
            .get_or_fetch_at("sheet", start, || {
                calls.set(calls.get() + 1);
                Ok(table(2))
            })
            .unwrap();
        let second = cache
            .get_or_fetch_at("sheet", start + Duration::from_secs(599), || {
                calls.set(calls.get() + 1);
                Ok(table(5))
            })
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first.table, &second.table));
        assert_eq!(second.fetched_at, start);
    }

    #[test]
    fn refetches_after_ttl() {
        let cache = SheetCache::new(Duration::from_secs(600));
        let start = Instant::now();

        cache.get_or_fetch_at("sheet", start, || Ok(table(2))).unwrap();
        let refreshed = cache
            .get_or_fetch_at("sheet", start + Duration::from_secs(600), || Ok(table(5)))
            .unwrap();

        assert_eq!(refreshed.table.height(), 5);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = SheetCache::default();
        let start = Instant::now();

        let failed = cache.get_or_fetch_at("sheet", start, || Err(LoaderError::NoData));
        assert!(failed.is_err());

        let ok = cache.get_or_fetch_at("sheet", start, || Ok(table(1))).unwrap();
        assert_eq!(ok.table.height(), 1);
    }

    #[test]
    fn invalidate_forces_refetch() {
        let cache = SheetCache::default();
        cache.get_or_fetch("a", || Ok(table(1))).unwrap();
        cache.get_or_fetch("b", || Ok(table(3))).unwrap();

        cache.invalidate("a");
        let a = cache.get_or_fetch("a", || Ok(table(4))).unwrap();
        let b = cache.get_or_fetch("b", || Ok(table(9))).unwrap();

        assert_eq!(a.table.height(), 4);
        assert_eq!(b.table.height(), 3);
    }

    #[test]
    fn concurrent_callers_share_one_fetch() {
        const CALLERS: usize = 8;
        let cache = SheetCache::default();
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(CALLERS);
        let (cache, calls, barrier) = (&cache, &calls, &barrier);

        let sheets: Vec<CachedSheet> = thread::scope(|s| {
            let handles: Vec<_> = (0..CALLERS)
                .map(|_| {
                    s.spawn(move || {
                        barrier.wait();
                        cache
                            .get_or_fetch("sheet", || {
                                calls.fetch_add(1, Ordering::SeqCst);
                                thread::sleep(Duration::from_millis(20));
                                Ok(table(3))
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(sheets.len(), CALLERS);
        assert!(sheets
            .iter()
            .all(|sheet| Arc::ptr_eq(&sheet.table, &sheets[0].table)));
    }
}
