//! Orchestration entry point for subtitle lookups and caption delivery.
//!
//! Lookup runs cache-first: an unexpired memoized answer short-circuits
//! everything, an identical in-flight run is attached to instead of
//! duplicated, and only then does the pipeline search the catalog, filter by
//! language and episode, resolve candidate archives, score entries and
//! assemble tracks. Every failure in that pipeline collapses to an empty
//! list; a missing subtitle is an expected outcome, not an error.
//!
//! Caption delivery is the independent second flow and surfaces classified
//! errors, since there the caller expects a definite outcome.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::archive::{self, ArchiveStore};
use crate::catalog::{CatalogClient, CatalogEntry, CatalogError};
use crate::config::Config;
use crate::matcher::{matches_episode, score_filenames};
use crate::metrics;
use crate::queue::QueueRegistry;
use crate::transcode;

use super::cache::{CaptionCache, ResultCache};
use super::lang::serve_code;
use super::types::{
    CaptionError, CaptionPayload, CaptionRequest, ResolvedTrack, SubtitleRequest,
};

type LookupRun = Shared<BoxFuture<'static, Vec<ResolvedTrack>>>;

/// The pipeline's front door. Cheap to clone through its inner `Arc`s; one
/// instance is shared by all concurrent requests.
pub struct FetchCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: Config,
    client: Arc<dyn CatalogClient>,
    queues: Arc<QueueRegistry>,
    archives: ArchiveStore,
    results: ResultCache,
    captions: CaptionCache,
    /// The sole synchronization point preventing duplicate upstream work
    /// for identical request keys.
    in_flight: Mutex<HashMap<String, LookupRun>>,
}

impl FetchCoordinator {
    pub fn new(config: Config, client: Arc<dyn CatalogClient>, queues: Arc<QueueRegistry>) -> Self {
        let cache = &config.cache;
        Self {
            inner: Arc::new(CoordinatorInner {
                archives: ArchiveStore::new(cache.archive_ttl()),
                results: ResultCache::new(cache.result_ttl(), cache.empty_result_ttl()),
                captions: CaptionCache::new(cache.caption_capacity, cache.caption_ttl()),
                in_flight: Mutex::new(HashMap::new()),
                client,
                queues,
                config,
            }),
        }
    }

    /// Resolve ranked caption tracks for a request.
    ///
    /// Concurrent calls with an identical key share a single pipeline run
    /// and observe the same outcome.
    pub async fn lookup(&self, request: SubtitleRequest) -> Vec<ResolvedTrack> {
        let key = request.cache_key();
        if let Some(tracks) = self.inner.results.get(&key).await {
            metrics::RESULT_CACHE.with_label_values(&["hit"]).inc();
            debug!(%key, tracks = tracks.len(), "lookup served from cache");
            return tracks;
        }
        metrics::RESULT_CACHE.with_label_values(&["miss"]).inc();

        let run = {
            let mut in_flight = self.inner.in_flight.lock().await;
            if let Some(run) = in_flight.get(&key) {
                metrics::LOOKUP_ATTACHED.inc();
                debug!(%key, "attaching to in-flight lookup");
                run.clone()
            } else {
                let inner = Arc::clone(&self.inner);
                let run_key = key.clone();
                let run: LookupRun = async move {
                    let tracks = inner.run_pipeline(&request).await;
                    inner.results.insert(run_key.clone(), tracks.clone()).await;
                    // Release the marker regardless of outcome.
                    inner.in_flight.lock().await.remove(&run_key);
                    tracks
                }
                .boxed()
                .shared();
                in_flight.insert(key, run.clone());
                run
            }
        };
        run.await
    }

    /// Deliver one decoded, transcoded caption entry.
    pub async fn caption(&self, request: CaptionRequest) -> Result<CaptionPayload, CaptionError> {
        let inner = &self.inner;
        let key = CaptionCache::key(&request.archive_id, &request.entry_path);

        if let Some(text) = inner.captions.get(&key).await {
            metrics::CAPTION_CACHE.with_label_values(&["hit"]).inc();
            return Ok(self.payload(text));
        }
        metrics::CAPTION_CACHE.with_label_values(&["miss"]).inc();

        let bundle = inner
            .archives
            .bundle(
                &request.archive_id,
                inner.client.download(&request.credential, &request.archive_id),
            )
            .await?;
        let raw = archive::extract_entry(&bundle.bytes, &request.entry_path)?;
        let text = transcode::to_vtt(&raw);
        inner.captions.insert(key, text.clone()).await;
        Ok(self.payload(text))
    }

    /// Whether a credential is accepted by the upstream catalog.
    pub async fn validate_credential(&self, credential: &str) -> bool {
        match self.inner.client.remaining_quota(credential).await {
            Ok(remaining) => {
                debug!(remaining, "credential validated");
                true
            }
            Err(err) => {
                debug!(error = %err, "credential validation failed");
                false
            }
        }
    }

    /// Reject all queued-but-not-started work for a credential. Issued when
    /// the user's context changes, e.g. they navigate to another title.
    pub async fn clear_credential(&self, credential: &str) -> usize {
        self.inner.queues.clear(credential).await
    }

    /// Reclaim idle credential lanes, expired archives and stale answers.
    /// Intended to be driven from the host's periodic tick.
    pub async fn sweep(&self) {
        let lanes = self.inner.queues.sweep().await;
        let archives = self.inner.archives.sweep().await;
        let results = self.inner.results.sweep().await;
        if lanes + archives + results > 0 {
            debug!(lanes, archives, results, "sweep reclaimed state");
        }
    }

    fn payload(&self, text: String) -> CaptionPayload {
        CaptionPayload {
            text,
            content_type: "text/vtt;charset=utf-8",
            cache_control: format!(
                "public, max-age={}",
                self.inner.captions.ttl().as_secs()
            ),
        }
    }
}

impl CoordinatorInner {
    /// One full pipeline run. Never fails; errors collapse to empty.
    async fn run_pipeline(&self, request: &SubtitleRequest) -> Vec<ResolvedTrack> {
        let timer = metrics::LOOKUP_DURATION.start_timer();
        let tracks = match self.resolve_tracks(request).await {
            Ok(tracks) => tracks,
            Err(CatalogError::Cancelled) => {
                debug!(imdb_id = %request.imdb_id, "lookup cancelled");
                Vec::new()
            }
            Err(err) => {
                warn!(imdb_id = %request.imdb_id, error = %err, "lookup failed");
                Vec::new()
            }
        };
        timer.observe_duration();
        debug!(imdb_id = %request.imdb_id, tracks = tracks.len(), "lookup complete");
        tracks
    }

    async fn resolve_tracks(
        &self,
        request: &SubtitleRequest,
    ) -> Result<Vec<ResolvedTrack>, CatalogError> {
        let entries = self
            .client
            .search(&request.credential, &request.imdb_id)
            .await?;
        metrics::SEARCH_RESULTS.observe(entries.len() as f64);

        let entries = filter_entries(entries, request);
        debug!(
            imdb_id = %request.imdb_id,
            candidates = entries.len(),
            "catalog entries after filtering"
        );

        let video = request.video_filename.clone().unwrap_or_default();

        // Resolve candidate archives concurrently; the download lane
        // enforces the actual parallelism and pacing.
        let listings = futures::future::join_all(entries.iter().map(|entry| async {
            self.archives
                .entries(
                    &entry.id,
                    self.client.download(&request.credential, &entry.id),
                )
                .await
        }))
        .await;

        let mut candidates: Vec<(u32, &CatalogEntry, String)> = Vec::new();
        for (entry, listing) in entries.iter().zip(listings) {
            for path in listing {
                // Archives may bundle a whole season; re-check per path.
                if let Some(episode) = request.episode {
                    if !matches_episode(&path, request.season, episode) {
                        continue;
                    }
                }
                let score = score_filenames(&video, &path);
                candidates.push((score, entry, path));
            }
        }

        candidates.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(candidates
            .into_iter()
            .map(|(_, entry, path)| self.resolved_track(entry, &path))
            .collect())
    }

    fn resolved_track(&self, entry: &CatalogEntry, path: &str) -> ResolvedTrack {
        let base = self.config.delivery.base_url.trim_end_matches('/');
        let encoded = urlencoding::encode(path);
        ResolvedTrack {
            id: format!("{}/{}", entry.id, encoded),
            url: format!("{base}/caption/{}/{encoded}.vtt", entry.id),
            lang: serve_code(&entry.language),
        }
    }
}

/// Keep entries in a requested language whose text matches the requested
/// episode. Movie requests skip the episode check; an empty language set
/// keeps every language.
fn filter_entries(entries: Vec<CatalogEntry>, request: &SubtitleRequest) -> Vec<CatalogEntry> {
    let wanted: Vec<String> = request.languages.iter().map(|l| l.to_lowercase()).collect();
    entries
        .into_iter()
        .filter(|entry| {
            if !wanted.is_empty() && !wanted.contains(&entry.language.to_lowercase()) {
                return false;
            }
            match request.episode {
                Some(episode) => {
                    let text = format!("{} {}", entry.title, entry.description);
                    matches_episode(&text, request.season, episode)
                }
                None => true,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, language: &str, title: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            language: language.to_string(),
            title: title.to_string(),
            description: String::new(),
        }
    }

    fn series_request(languages: &[&str]) -> SubtitleRequest {
        SubtitleRequest {
            credential: "key".to_string(),
            imdb_id: "tt1".to_string(),
            season: Some(2),
            episode: Some(5),
            video_filename: None,
            languages: languages.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_filter_entries_by_language() {
        let entries = vec![
            entry("1", "rum", "Show S02E05"),
            entry("2", "eng", "Show S02E05"),
            entry("3", "ger", "Show S02E05"),
        ];
        let kept = filter_entries(entries, &series_request(&["rum", "eng"]));
        assert_eq!(kept.len(), 2);

        let entries = vec![entry("1", "rum", "Show S02E05"), entry("2", "eng", "Show S02E05")];
        let kept = filter_entries(entries, &series_request(&[]));
        assert_eq!(kept.len(), 2, "empty language set keeps everything");
    }

    #[test]
    fn test_filter_entries_by_episode() {
        let entries = vec![
            entry("1", "rum", "Show S02E05 WEB"),
            entry("2", "rum", "Show S02E06 WEB"),
            entry("3", "rum", "Show S01E05 WEB"),
        ];
        let kept = filter_entries(entries, &series_request(&["rum"]));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "1");
    }

    #[test]
    fn test_filter_entries_movie_skips_episode_check() {
        let mut request = series_request(&["rum"]);
        request.season = None;
        request.episode = None;
        let entries = vec![entry("1", "rum", "Some Movie 2020")];
        assert_eq!(filter_entries(entries, &request).len(), 1);
    }
}
