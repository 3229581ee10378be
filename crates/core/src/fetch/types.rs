//! Request and result types for the lookup and delivery flows.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::catalog::CatalogError;

/// What the caller wants subtitles for.
#[derive(Debug, Clone)]
pub struct SubtitleRequest {
    /// Per-user API key; scopes upstream auth and rate limiting.
    pub credential: String,
    /// Title identifier (IMDB id).
    pub imdb_id: String,
    /// Season number, when known. Absolute-numbered series leave it unset.
    pub season: Option<u32>,
    /// Episode number; unset for movies.
    pub episode: Option<u32>,
    /// The caller's local video filename, used to rank candidates.
    pub video_filename: Option<String>,
    /// Requested upstream language codes; empty keeps every language.
    pub languages: Vec<String>,
}

impl SubtitleRequest {
    /// Memoization key: title id, episode coordinates and the sorted
    /// language set. The video filename is deliberately not part of it.
    pub(crate) fn cache_key(&self) -> String {
        let mut languages: Vec<String> =
            self.languages.iter().map(|l| l.to_lowercase()).collect();
        languages.sort();
        languages.dedup();
        format!(
            "{}:{}:{}:{}",
            self.imdb_id,
            self.season.map(|s| s.to_string()).unwrap_or_default(),
            self.episode.map(|e| e.to_string()).unwrap_or_default(),
            languages.join(",")
        )
    }
}

/// A caption track offered to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedTrack {
    /// External id, stable per (archive, entry).
    pub id: String,
    /// Fully-qualified delivery URL.
    pub url: String,
    /// Served language code (mapped from the upstream code).
    pub lang: String,
}

/// What the caller wants delivered.
#[derive(Debug, Clone)]
pub struct CaptionRequest {
    pub credential: String,
    /// The subtitle/archive id from the track URL.
    pub archive_id: String,
    /// Decoded entry path inside the archive.
    pub entry_path: String,
}

/// A ready-to-serve caption body.
#[derive(Debug, Clone)]
pub struct CaptionPayload {
    /// WebVTT text.
    pub text: String,
    pub content_type: &'static str,
    /// Cache-control directive reflecting the caption cache TTL.
    pub cache_control: String,
}

/// Delivery-path failures, classified for the caller's response status.
///
/// Unlike the lookup pipeline, delivery is a direct content request with a
/// definite outcome, so causes are surfaced instead of collapsed.
#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("caption not found: {0}")]
    NotFound(String),

    #[error("credential rejected")]
    Unauthorized,

    #[error("upstream quota exhausted")]
    TooManyRequests,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CatalogError> for CaptionError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(message) => CaptionError::NotFound(message),
            CatalogError::Auth => CaptionError::Unauthorized,
            CatalogError::QuotaExceeded => CaptionError::TooManyRequests,
            other => CaptionError::Internal(other.to_string()),
        }
    }
}

impl From<ArchiveError> for CaptionError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::EntryNotFound(path) => CaptionError::NotFound(path),
            other => CaptionError::Internal(other.to_string()),
        }
    }
}
