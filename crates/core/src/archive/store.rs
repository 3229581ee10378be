//! Shared time-bounded cache of downloaded archives.
//!
//! One bundle exists per subtitle id at any time; concurrent callers for the
//! same id serialize on a per-id lock so the download and parse happen once
//! per TTL window. Expired bundles are replaced on the next request.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::catalog::CatalogError;
use crate::metrics;

use super::codec::{self, ArchiveKind};

/// A downloaded compressed container and its enumerated caption entries.
#[derive(Debug)]
pub struct ArchiveBundle {
    pub subtitle_id: String,
    pub bytes: Vec<u8>,
    pub kind: ArchiveKind,
    pub entries: Vec<String>,
    fetched_at: Instant,
}

#[derive(Default)]
struct Slot {
    bundle: Option<Arc<ArchiveBundle>>,
}

pub struct ArchiveStore {
    ttl: Duration,
    slots: Mutex<HashMap<String, Arc<Mutex<Slot>>>>,
}

impl ArchiveStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The bundle for `subtitle_id`, downloading through `download` at most
    /// once per TTL window. Download and parse failures are surfaced.
    pub async fn bundle<F>(
        &self,
        subtitle_id: &str,
        download: F,
    ) -> Result<Arc<ArchiveBundle>, CatalogError>
    where
        F: Future<Output = Result<Vec<u8>, CatalogError>>,
    {
        let slot = {
            let mut slots = self.slots.lock().await;
            Arc::clone(
                slots
                    .entry(subtitle_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(Slot::default()))),
            )
        };

        // Concurrent callers for the same id queue here; the first one in
        // downloads, the rest observe its bundle.
        let mut slot = slot.lock().await;
        if let Some(bundle) = &slot.bundle {
            if bundle.fetched_at.elapsed() < self.ttl {
                metrics::ARCHIVE_CACHE.with_label_values(&["hit"]).inc();
                return Ok(Arc::clone(bundle));
            }
        }
        metrics::ARCHIVE_CACHE.with_label_values(&["miss"]).inc();

        let bytes = download.await?;
        let kind = codec::detect_kind(&bytes);
        let entries =
            codec::list_entries(&bytes).map_err(|e| CatalogError::Decode(e.to_string()))?;
        debug!(
            subtitle_id,
            size = bytes.len(),
            entries = entries.len(),
            "archive downloaded"
        );

        let bundle = Arc::new(ArchiveBundle {
            subtitle_id: subtitle_id.to_string(),
            bytes,
            kind,
            entries,
            fetched_at: Instant::now(),
        });
        slot.bundle = Some(Arc::clone(&bundle));
        Ok(bundle)
    }

    /// The caption entry paths for `subtitle_id`. Failures collapse to an
    /// empty listing; the lookup pipeline treats missing archives as
    /// candidates without files, not as errors.
    pub async fn entries<F>(&self, subtitle_id: &str, download: F) -> Vec<String>
    where
        F: Future<Output = Result<Vec<u8>, CatalogError>>,
    {
        match self.bundle(subtitle_id, download).await {
            Ok(bundle) => bundle.entries.clone(),
            Err(CatalogError::Cancelled) => {
                debug!(subtitle_id, "archive fetch cancelled");
                Vec::new()
            }
            Err(err) => {
                warn!(subtitle_id, error = %err, "archive resolution failed");
                Vec::new()
            }
        }
    }

    /// Drop expired bundles. Slots whose lock is contended are skipped and
    /// picked up by a later sweep.
    pub async fn sweep(&self) -> usize {
        let mut slots = self.slots.lock().await;
        let mut expired = Vec::new();
        for (id, slot) in slots.iter() {
            if let Ok(slot) = slot.try_lock() {
                let stale = match &slot.bundle {
                    Some(bundle) => bundle.fetched_at.elapsed() >= self.ttl,
                    None => true,
                };
                if stale {
                    expired.push(id.clone());
                }
            }
        }
        for id in &expired {
            slots.remove(id);
        }
        expired.len()
    }
}
