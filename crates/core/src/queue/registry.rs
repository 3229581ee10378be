//! Per-credential lane registry.
//!
//! Lane sets are created lazily on first use of a credential and reclaimed
//! when idle past the timeout, or oldest-idle first when the registry grows
//! past its ceiling. Reclamation happens opportunistically on access; hosts
//! that want bounded staleness can drive `sweep()` from their own tick.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::QueueConfig;
use crate::metrics;

use super::lane::Lane;

/// The two lanes scoped to one credential.
pub struct CredentialQueues {
    /// Strictly sequential metadata lane.
    pub search: Lane<serde_json::Value>,
    /// Bounded-parallel archive lane.
    pub download: Lane<Vec<u8>>,
    last_used: Mutex<Instant>,
}

impl CredentialQueues {
    fn new(config: &QueueConfig) -> Self {
        Self {
            search: Lane::sequential("search", config.search_interval(), config.retry_limit),
            download: Lane::staggered(
                "download",
                config.download_concurrency,
                config.download_stagger(),
                config.retry_limit,
            ),
            last_used: Mutex::new(Instant::now()),
        }
    }

    async fn touch(&self) {
        *self.last_used.lock().await = Instant::now();
    }

    async fn idle_for(&self) -> Duration {
        self.last_used.lock().await.elapsed()
    }

    /// Reject all queued-but-not-started jobs on both lanes.
    pub async fn clear(&self) -> usize {
        self.search.clear().await + self.download.clear().await
    }
}

pub struct QueueRegistry {
    config: QueueConfig,
    states: Mutex<HashMap<String, Arc<CredentialQueues>>>,
}

impl QueueRegistry {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// The lane set for `credential`, creating it on first use.
    pub async fn queues(&self, credential: &str) -> Arc<CredentialQueues> {
        let mut states = self.states.lock().await;
        Self::evict_idle(&mut states, self.config.idle_timeout()).await;

        if let Some(queues) = states.get(credential) {
            queues.touch().await;
            return Arc::clone(queues);
        }

        while states.len() >= self.config.max_credential_states.max(1) {
            Self::evict_oldest(&mut states).await;
        }

        debug!(credential = %redact(credential), "creating credential lanes");
        let queues = Arc::new(CredentialQueues::new(&self.config));
        states.insert(credential.to_string(), Arc::clone(&queues));
        queues
    }

    /// Clear both lanes of a credential, if it has live state.
    pub async fn clear(&self, credential: &str) -> usize {
        let queues = {
            let states = self.states.lock().await;
            states.get(credential).map(Arc::clone)
        };
        match queues {
            Some(queues) => queues.clear().await,
            None => 0,
        }
    }

    /// Evict every lane set idle past the timeout.
    pub async fn sweep(&self) -> usize {
        let mut states = self.states.lock().await;
        Self::evict_idle(&mut states, self.config.idle_timeout()).await
    }

    /// Number of live credential states.
    pub async fn len(&self) -> usize {
        self.states.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.states.lock().await.is_empty()
    }

    async fn evict_idle(
        states: &mut HashMap<String, Arc<CredentialQueues>>,
        idle_timeout: Duration,
    ) -> usize {
        let mut expired = Vec::new();
        for (credential, queues) in states.iter() {
            if queues.idle_for().await >= idle_timeout {
                expired.push(credential.clone());
            }
        }
        for credential in &expired {
            if let Some(queues) = states.remove(credential) {
                queues.clear().await;
                metrics::CREDENTIAL_EVICTIONS.inc();
            }
        }
        expired.len()
    }

    async fn evict_oldest(states: &mut HashMap<String, Arc<CredentialQueues>>) {
        let mut oldest: Option<(String, Duration)> = None;
        for (credential, queues) in states.iter() {
            let idle = queues.idle_for().await;
            if oldest.as_ref().map(|(_, best)| idle > *best).unwrap_or(true) {
                oldest = Some((credential.clone(), idle));
            }
        }
        if let Some((credential, _)) = oldest {
            if let Some(queues) = states.remove(&credential) {
                queues.clear().await;
                metrics::CREDENTIAL_EVICTIONS.inc();
                debug!(credential = %redact(&credential), "evicted oldest credential lanes");
            }
        }
    }
}

/// Credentials are secrets; logs only ever see a prefix.
fn redact(credential: &str) -> String {
    let prefix: String = credential.chars().take(4).collect();
    format!("{prefix}…")
}
