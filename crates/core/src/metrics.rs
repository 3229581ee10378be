//! Prometheus metrics for the subtitle pipeline.
//!
//! This module provides metrics for:
//! - Upstream traffic (per lane, per outcome, retries)
//! - Caches (result, caption, archive hit/miss, credential evictions)
//! - Lookup pipeline (duration, attach-to-in-flight, result counts)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Upstream traffic
// =============================================================================

/// Upstream catalog requests by lane and outcome.
pub static UPSTREAM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "subfetch_upstream_requests_total",
            "Upstream catalog requests",
        ),
        &["lane", "outcome"], // outcome: "ok", "error", "exhausted"
    )
    .unwrap()
});

/// Transparent retries performed by the lanes.
pub static RETRY_ATTEMPTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("subfetch_retry_attempts_total", "Lane retry attempts").unwrap()
});

/// Queued jobs rejected by a clear signal.
pub static QUEUE_CANCELLED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "subfetch_queue_cancelled_total",
        "Queued jobs rejected by clear",
    )
    .unwrap()
});

/// Credential lane sets reclaimed by idle timeout or capacity pressure.
pub static CREDENTIAL_EVICTIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "subfetch_credential_evictions_total",
        "Credential lane sets evicted",
    )
    .unwrap()
});

// =============================================================================
// Caches
// =============================================================================

/// Result cache reads by outcome ("hit" / "miss").
pub static RESULT_CACHE: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("subfetch_result_cache_total", "Result cache reads"),
        &["outcome"],
    )
    .unwrap()
});

/// Caption cache reads by outcome ("hit" / "miss").
pub static CAPTION_CACHE: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("subfetch_caption_cache_total", "Caption cache reads"),
        &["outcome"],
    )
    .unwrap()
});

/// Archive store reads by outcome ("hit" / "miss").
pub static ARCHIVE_CACHE: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("subfetch_archive_cache_total", "Archive store reads"),
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Lookup pipeline
// =============================================================================

/// Lookups that attached to an already-running identical request.
pub static LOOKUP_ATTACHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "subfetch_lookup_attached_total",
        "Lookups de-duplicated onto an in-flight run",
    )
    .unwrap()
});

/// Catalog entries returned per search.
pub static SEARCH_RESULTS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "subfetch_search_results",
            "Catalog entries returned per search",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
    )
    .unwrap()
});

/// Duration of a full lookup pipeline run in seconds.
pub static LOOKUP_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "subfetch_lookup_duration_seconds",
            "Duration of a lookup pipeline run",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(UPSTREAM_REQUESTS.clone()),
        Box::new(RETRY_ATTEMPTS.clone()),
        Box::new(QUEUE_CANCELLED.clone()),
        Box::new(CREDENTIAL_EVICTIONS.clone()),
        Box::new(RESULT_CACHE.clone()),
        Box::new(CAPTION_CACHE.clone()),
        Box::new(ARCHIVE_CACHE.clone()),
        Box::new(LOOKUP_ATTACHED.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        Box::new(LOOKUP_DURATION.clone()),
    ]
}
