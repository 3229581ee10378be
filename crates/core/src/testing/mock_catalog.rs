//! Mock catalog client for testing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::catalog::{CatalogClient, CatalogEntry, CatalogError};

/// Mock implementation of the `CatalogClient` trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable search entries and archive bytes
/// - Track search/download calls for assertions
/// - Simulate failures and slow responses
pub struct MockCatalog {
    entries: Arc<RwLock<Vec<CatalogEntry>>>,
    archives: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    search_delay: Arc<RwLock<Option<Duration>>>,
    next_search_error: Arc<RwLock<Option<CatalogError>>>,
    next_download_error: Arc<RwLock<Option<CatalogError>>>,
    search_calls: Arc<RwLock<Vec<String>>>,
    download_calls: Arc<RwLock<Vec<String>>>,
    quota: Arc<RwLock<Result<i64, ()>>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            archives: Arc::new(RwLock::new(HashMap::new())),
            search_delay: Arc::new(RwLock::new(None)),
            next_search_error: Arc::new(RwLock::new(None)),
            next_download_error: Arc::new(RwLock::new(None)),
            search_calls: Arc::new(RwLock::new(Vec::new())),
            download_calls: Arc::new(RwLock::new(Vec::new())),
            quota: Arc::new(RwLock::new(Ok(100))),
        }
    }

    /// Entries returned by every search.
    pub async fn set_entries(&self, entries: Vec<CatalogEntry>) {
        *self.entries.write().await = entries;
    }

    /// Archive bytes served for a subtitle id.
    pub async fn set_archive(&self, subtitle_id: &str, bytes: Vec<u8>) {
        self.archives
            .write()
            .await
            .insert(subtitle_id.to_string(), bytes);
    }

    /// Delay applied to the next searches, simulating a slow upstream.
    pub async fn set_search_delay(&self, delay: Duration) {
        *self.search_delay.write().await = Some(delay);
    }

    /// Fail the next search with this error.
    pub async fn fail_next_search(&self, error: CatalogError) {
        *self.next_search_error.write().await = Some(error);
    }

    /// Fail the next download with this error.
    pub async fn fail_next_download(&self, error: CatalogError) {
        *self.next_download_error.write().await = Some(error);
    }

    /// Remaining quota reported by `remaining_quota`; `Err` makes the call
    /// fail with an auth rejection.
    pub async fn set_quota(&self, quota: Result<i64, ()>) {
        *self.quota.write().await = quota;
    }

    pub async fn search_call_count(&self) -> usize {
        self.search_calls.read().await.len()
    }

    pub async fn download_call_count(&self) -> usize {
        self.download_calls.read().await.len()
    }

    pub async fn downloaded_ids(&self) -> Vec<String> {
        self.download_calls.read().await.clone()
    }
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogClient for MockCatalog {
    async fn search(
        &self,
        _credential: &str,
        imdb_id: &str,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.search_calls.write().await.push(imdb_id.to_string());
        let delay = *self.search_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.next_search_error.write().await.take() {
            return Err(error);
        }
        Ok(self.entries.read().await.clone())
    }

    async fn download(
        &self,
        _credential: &str,
        subtitle_id: &str,
    ) -> Result<Vec<u8>, CatalogError> {
        self.download_calls
            .write()
            .await
            .push(subtitle_id.to_string());
        if let Some(error) = self.next_download_error.write().await.take() {
            return Err(error);
        }
        self.archives
            .read()
            .await
            .get(subtitle_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(subtitle_id.to_string()))
    }

    async fn remaining_quota(&self, _credential: &str) -> Result<i64, CatalogError> {
        match *self.quota.read().await {
            Ok(remaining) => Ok(remaining),
            Err(()) => Err(CatalogError::Auth),
        }
    }
}
