//! Final-output caches: resolved track lists and decoded captions.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::types::ResolvedTrack;

/// Memoized lookup answers. Unbounded, time-expiring; empty answers get a
/// shorter TTL so genuinely absent captions are retried sooner than
/// confirmed hits.
pub(crate) struct ResultCache {
    ttl: Duration,
    empty_ttl: Duration,
    entries: Mutex<HashMap<String, CachedResult>>,
}

struct CachedResult {
    tracks: Vec<ResolvedTrack>,
    created: Instant,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration, empty_ttl: Duration) -> Self {
        Self {
            ttl,
            empty_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Vec<ResolvedTrack>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(cached) if cached.created.elapsed() < cached.ttl => Some(cached.tracks.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: String, tracks: Vec<ResolvedTrack>) {
        let ttl = if tracks.is_empty() { self.empty_ttl } else { self.ttl };
        self.entries.lock().await.insert(
            key,
            CachedResult {
                tracks,
                created: Instant::now(),
                ttl,
            },
        );
    }

    /// Drop expired answers.
    pub async fn sweep(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, cached| cached.created.elapsed() < cached.ttl);
        before - entries.len()
    }
}

/// Decoded, format-converted caption texts. Capacity-bounded with
/// least-recently-used eviction on top of the TTL.
pub(crate) struct CaptionCache {
    ttl: Duration,
    entries: Mutex<LruCache<String, CaptionEntry>>,
}

struct CaptionEntry {
    text: String,
    inserted: Instant,
}

impl CaptionCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Cache key for one entry of one archive.
    pub fn key(archive_id: &str, entry_path: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(archive_id.as_bytes());
        hasher.update(b"|");
        hasher.update(entry_path.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.inserted.elapsed() < self.ttl => Some(entry.text.clone()),
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: String, text: String) {
        self.entries.lock().await.put(
            key,
            CaptionEntry {
                text,
                inserted: Instant::now(),
            },
        );
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
