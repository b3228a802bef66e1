//! Folder listing cache
//!
//! Memoizes fetch+parse per folder id. Each successful listing is stored
//! with its own eviction timer that removes it `ttl` after insertion;
//! failures are never stored, so the next lookup retries from scratch.
//!
//! Concurrent misses for the same folder are not coalesced: each one fetches
//! and the last writer wins the slot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use adx_common::Clock;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use super::fetch::{FetchError, FolderViewSource};
use super::parse::{self, ParseError};
use super::FolderItem;

/// How long a parsed listing stays cached
pub const FOLDER_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Folder lookup errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FolderError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

struct CacheEntry {
    items: Arc<[FolderItem]>,
    /// Distinguishes a replacement from the entry an old timer was armed for
    generation: u64,
}

type EntryMap = RwLock<HashMap<String, CacheEntry>>;

/// Time-limited cache of parsed folder listings
pub struct FolderCache {
    source: Arc<dyn FolderViewSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: Arc<EntryMap>,
    next_generation: AtomicU64,
}

impl FolderCache {
    pub fn new(source: Arc<dyn FolderViewSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            ttl: FOLDER_CACHE_TTL,
            entries: Arc::new(RwLock::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the listing for `folder_id`, fetching and parsing it on a miss
    ///
    /// The returned slice is shared with the cache and stays valid after the
    /// entry is evicted.
    pub async fn get(&self, folder_id: &str) -> Result<Arc<[FolderItem]>, FolderError> {
        if let Some(entry) = self.entries.read().await.get(folder_id) {
            debug!(folder_id = %folder_id, "Folder cache hit");
            return Ok(Arc::clone(&entry.items));
        }

        debug!(folder_id = %folder_id, "Folder cache miss");

        let markup = self.source.fetch(folder_id).await?;
        let items: Arc<[FolderItem]> = parse::parse(&markup, self.clock.as_ref())?.into();

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        self.entries.write().await.insert(
            folder_id.to_string(),
            CacheEntry {
                items: Arc::clone(&items),
                generation,
            },
        );
        self.schedule_eviction(folder_id.to_string(), generation);

        debug!(
            folder_id = %folder_id,
            items = items.len(),
            ttl_secs = self.ttl.as_secs(),
            "Cached folder listing"
        );

        Ok(items)
    }

    /// Drop the cached listing for `folder_id`; the next `get` refetches
    ///
    /// Returns whether an entry was present.
    pub async fn invalidate(&self, folder_id: &str) -> bool {
        let removed = self.entries.write().await.remove(folder_id).is_some();
        if removed {
            debug!(folder_id = %folder_id, "Folder cache entry invalidated");
        }
        removed
    }

    /// Number of cached listings
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn schedule_eviction(&self, folder_id: String, generation: u64) {
        let entries: Weak<EntryMap> = Arc::downgrade(&self.entries);
        let ttl = self.ttl;

        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;

            let Some(entries) = entries.upgrade() else {
                return;
            };
            let mut entries = entries.write().await;
            if entries
                .get(&folder_id)
                .is_some_and(|entry| entry.generation == generation)
            {
                entries.remove(&folder_id);
                debug!(folder_id = %folder_id, "Folder cache entry expired");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdrive::ItemKind;
    use adx_common::time::FixedClock;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::AtomicUsize;

    const FOLDER_ID: &str = "1cccccccccccccccccccccccccccccccc";

    const MARKUP: &str = r#"<div class="flip-entries">
<div class="flip-entry" id="entry-trackfile"><a href="/file/d/trackfile/view">
  <div class="flip-entry-title">track.mp3</div>
  <div class="flip-entry-last-modified"><div>03/05/24</div></div>
</a></div>
<div class="flip-entry" id="entry-chartfile"><a href="/file/d/chartfile/view">
  <div class="flip-entry-title">maidata.txt</div>
  <div class="flip-entry-last-modified"><div>Jan 27</div></div>
</a></div>
</div>"#;

    /// Mock folder view source counting upstream fetches
    struct MockSource {
        markup: String,
        calls: AtomicUsize,
        failures_left: AtomicUsize,
    }

    impl MockSource {
        fn new(markup: &str) -> Arc<Self> {
            Self::failing_first(markup, 0)
        }

        fn failing_first(markup: &str, failures: usize) -> Arc<Self> {
            Arc::new(Self {
                markup: markup.to_string(),
                calls: AtomicUsize::new(0),
                failures_left: AtomicUsize::new(failures),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FolderViewSource for MockSource {
        async fn fetch(&self, folder_id: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;

            let failing = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(FetchError::Status {
                    url: format!("mock://{}", folder_id),
                    status: 500,
                    reason: "Internal Server Error".to_string(),
                });
            }
            Ok(self.markup.clone())
        }
    }

    fn cache(source: Arc<MockSource>) -> FolderCache {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap());
        FolderCache::new(source, Arc::new(clock))
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl_does_not_refetch() {
        let source = MockSource::new(MARKUP);
        let cache = cache(source.clone());

        let first = cache.get(FOLDER_ID).await.unwrap();
        tokio::time::sleep(FOLDER_CACHE_TTL - Duration::from_secs(1)).await;
        let second = cache.get(FOLDER_ID).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].name, "track.mp3");
        assert_eq!(first[1].kind, ItemKind::File);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_after_ttl_refetches_once() {
        let source = MockSource::new(MARKUP);
        let cache = cache(source.clone());

        cache.get(FOLDER_ID).await.unwrap();
        tokio::time::sleep(FOLDER_CACHE_TTL + Duration::from_secs(1)).await;

        assert!(cache.is_empty().await, "entry should have been evicted");

        cache.get(FOLDER_ID).await.unwrap();
        cache.get(FOLDER_ID).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_does_not_retract_handed_out_data() {
        let source = MockSource::new(MARKUP);
        let cache = cache(source);

        let items = cache.get(FOLDER_ID).await.unwrap();
        tokio::time::sleep(FOLDER_CACHE_TTL * 2).await;

        assert_eq!(cache.len().await, 0);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].name, "maidata.txt");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_is_not_cached() {
        let source = MockSource::failing_first(MARKUP, 1);
        let cache = cache(source.clone());

        let err = cache.get(FOLDER_ID).await.unwrap_err();
        assert!(matches!(err, FolderError::Fetch(FetchError::Status { status: 500, .. })));
        assert!(cache.is_empty().await);

        let items = cache.get(FOLDER_ID).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_parse_is_not_cached() {
        let source = MockSource::new(
            r#"<div class="flip-entry" id="bogus"><a href="/file/d/x"></a></div>"#,
        );
        let cache = cache(source.clone());

        for _ in 0..2 {
            let err = cache.get(FOLDER_ID).await.unwrap_err();
            assert!(matches!(err, FolderError::Parse(ParseError::MalformedId(_))));
        }
        assert!(cache.is_empty().await);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_refetch() {
        let source = MockSource::new(MARKUP);
        let cache = cache(source.clone());

        cache.get(FOLDER_ID).await.unwrap();
        assert!(cache.invalidate(FOLDER_ID).await);
        assert!(!cache.invalidate(FOLDER_ID).await);

        cache.get(FOLDER_ID).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_does_not_evict_replacement() {
        let source = MockSource::new(MARKUP);
        let cache = cache(source.clone());

        cache.get(FOLDER_ID).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10 * 60)).await;
        cache.invalidate(FOLDER_ID).await;
        cache.get(FOLDER_ID).await.unwrap();

        // First entry's timer fires at 30 min; the replacement lives until 40 min
        tokio::time::sleep(Duration::from_secs(21 * 60)).await;
        assert_eq!(cache.len().await, 1);
        cache.get(FOLDER_ID).await.unwrap();
        assert_eq!(source.calls(), 2);

        tokio::time::sleep(Duration::from_secs(10 * 60)).await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_ttl() {
        let source = MockSource::new(MARKUP);
        let cache = cache(source.clone()).with_ttl(Duration::from_secs(5));
        assert_eq!(cache.ttl(), Duration::from_secs(5));

        cache.get(FOLDER_ID).await.unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        cache.get(FOLDER_ID).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_each_fetch() {
        let source = MockSource::new(MARKUP);
        let cache = cache(source.clone());

        let (a, b) = tokio::join!(cache.get(FOLDER_ID), cache.get(FOLDER_ID));
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(source.calls(), 2);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_folders_are_cached_independently() {
        let source = MockSource::new(MARKUP);
        let cache = cache(source.clone());

        cache.get("1aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").await.unwrap();
        cache.get("1bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb").await.unwrap();
        cache.get("1aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").await.unwrap();

        assert_eq!(source.calls(), 2);
        assert_eq!(cache.len().await, 2);
    }
}
