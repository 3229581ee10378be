//! HTTP client for the upstream subtitle catalog.
//!
//! Every request is funneled through the credential's lanes: search and
//! quota hit the metadata endpoint and go through the sequential search
//! lane, archive downloads go through the bounded-parallel download lane.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::CatalogConfig;
use crate::queue::{JobFn, QueueRegistry};

use super::types::{CatalogEntry, CatalogError, QuotaResponse, SearchResponse};

/// Header carrying the per-user API key.
const CREDENTIAL_HEADER: &str = "x-api-key";

/// The upstream seam. The pipeline talks to this trait so tests can swap in
/// a recording mock.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Search catalog entries for an IMDB title id.
    async fn search(
        &self,
        credential: &str,
        imdb_id: &str,
    ) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Download the compressed archive for a subtitle id.
    async fn download(&self, credential: &str, subtitle_id: &str)
        -> Result<Vec<u8>, CatalogError>;

    /// Remaining request quota for a credential.
    async fn remaining_quota(&self, credential: &str) -> Result<i64, CatalogError>;
}

pub struct HttpCatalogClient {
    client: Client,
    config: CatalogConfig,
    queues: Arc<QueueRegistry>,
}

impl HttpCatalogClient {
    pub fn new(config: CatalogConfig, queues: Arc<QueueRegistry>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create HTTP client");
        Self {
            client,
            config,
            queues,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// A search-lane job fetching `url` and returning the parsed JSON body.
    fn json_job(&self, credential: &str, url: String) -> JobFn<serde_json::Value> {
        let client = self.client.clone();
        let credential = credential.to_string();
        Box::new(move || {
            let client = client.clone();
            let url = url.clone();
            let credential = credential.clone();
            Box::pin(async move {
                let response = client
                    .get(&url)
                    .header(CREDENTIAL_HEADER, &credential)
                    .send()
                    .await
                    .map_err(CatalogError::from_reqwest)?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(CatalogError::from_status(
                        status.as_u16(),
                        body.chars().take(200).collect(),
                    ));
                }
                response
                    .json::<serde_json::Value>()
                    .await
                    .map_err(CatalogError::from_reqwest)
            })
        })
    }

    /// A download-lane job fetching `url` as bytes, capped at the configured
    /// archive size.
    fn bytes_job(&self, credential: &str, url: String) -> JobFn<Vec<u8>> {
        let client = self.client.clone();
        let credential = credential.to_string();
        let limit = self.config.max_archive_bytes;
        Box::new(move || {
            let client = client.clone();
            let url = url.clone();
            let credential = credential.clone();
            Box::pin(async move {
                let mut response = client
                    .get(&url)
                    .header(CREDENTIAL_HEADER, &credential)
                    .send()
                    .await
                    .map_err(CatalogError::from_reqwest)?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(CatalogError::from_status(
                        status.as_u16(),
                        body.chars().take(200).collect(),
                    ));
                }
                if response.content_length().unwrap_or(0) > limit {
                    return Err(CatalogError::TooLarge { limit });
                }
                let mut body = Vec::new();
                while let Some(chunk) = response.chunk().await.map_err(CatalogError::from_reqwest)?
                {
                    if body.len() + chunk.len() > limit as usize {
                        return Err(CatalogError::TooLarge { limit });
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(body)
            })
        })
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn search(
        &self,
        credential: &str,
        imdb_id: &str,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let url = self.endpoint(&format!("/search/imdbid/{}", urlencoding::encode(imdb_id)));
        debug!(imdb_id, "catalog search");

        let queues = self.queues.queues(credential).await;
        let value = queues.search.submit(self.json_job(credential, url)).await?;
        let parsed: SearchResponse =
            serde_json::from_value(value).map_err(|e| CatalogError::Decode(e.to_string()))?;
        debug!(imdb_id, items = parsed.items.len(), "catalog search complete");
        Ok(parsed.items)
    }

    async fn download(
        &self,
        credential: &str,
        subtitle_id: &str,
    ) -> Result<Vec<u8>, CatalogError> {
        let url = self.endpoint(&format!(
            "/subtitle/{}/download",
            urlencoding::encode(subtitle_id)
        ));
        debug!(subtitle_id, "archive download");

        let queues = self.queues.queues(credential).await;
        queues.download.submit(self.bytes_job(credential, url)).await
    }

    async fn remaining_quota(&self, credential: &str) -> Result<i64, CatalogError> {
        let url = self.endpoint("/quota");
        let queues = self.queues.queues(credential).await;
        let value = queues.search.submit(self.json_job(credential, url)).await?;
        let parsed: QuotaResponse =
            serde_json::from_value(value).map_err(|e| CatalogError::Decode(e.to_string()))?;
        Ok(parsed.quota.remaining_quota)
    }
}
