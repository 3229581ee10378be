//! Types and error taxonomy for the upstream subtitle catalog.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One upstream search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Upstream subtitle id, also the archive download id.
    pub id: String,
    /// Upstream language code (ISO 639-2 style).
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Body of `GET /search/imdbid/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub items: Vec<CatalogEntry>,
}

/// Body of `GET /quota`.
#[derive(Debug, Deserialize)]
pub(crate) struct QuotaResponse {
    pub quota: QuotaBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuotaBody {
    pub remaining_quota: i64,
}

/// Errors from upstream catalog access.
///
/// Only `Transient` is retried by the queue; everything else fails the
/// caller's pending operation immediately.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Connection reset, timeout or abort.
    #[error("transient upstream failure: {0}")]
    Transient(String),

    #[error("credential rejected by upstream")]
    Auth,

    #[error("upstream quota exhausted")]
    QuotaExceeded,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("response exceeds size cap of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("request cancelled")]
    Cancelled,

    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("malformed content: {0}")]
    Decode(String),
}

impl CatalogError {
    /// Whether the queue may retry this failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, CatalogError::Transient(_))
    }

    /// Classify a transport-level failure.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            return CatalogError::Transient(err.to_string());
        }
        if err.is_decode() {
            return CatalogError::Decode(err.to_string());
        }
        match err.status() {
            Some(status) => Self::from_status(status.as_u16(), err.to_string()),
            // A body read aborted mid-transfer behaves like a reset.
            None => CatalogError::Transient(err.to_string()),
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => CatalogError::Auth,
            429 => CatalogError::QuotaExceeded,
            404 => CatalogError::NotFound(message),
            _ => CatalogError::Api { status, message },
        }
    }
}
