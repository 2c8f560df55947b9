//! Collector contract and per-platform registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing;

use audithub_entity::audit::Platform;

use crate::error::CollectionError;
use crate::types::{PostData, ProfileData};

/// Capability interface for fetching a profile and its recent posts.
///
/// Implementations must not retry internally; they surface the first
/// failure and let the queue decide.
#[async_trait]
pub trait ProfileCollector: Send + Sync + std::fmt::Debug {
    /// Fetch the profile and a sample of recent posts for `username`.
    async fn fetch_profile(
        &self,
        username: &str,
    ) -> Result<(ProfileData, Vec<PostData>), CollectionError>;
}

/// Registry mapping platforms to their collectors.
///
/// Every dispatch goes through [`CollectorRegistry::collect`], which
/// enforces the bounded timeout; collectors themselves stay free of
/// deadline handling.
#[derive(Debug)]
pub struct CollectorRegistry {
    collectors: HashMap<Platform, Arc<dyn ProfileCollector>>,
    call_timeout: Duration,
}

impl CollectorRegistry {
    /// Create an empty registry with the given per-call timeout.
    pub fn new(call_timeout: Duration) -> Self {
        Self {
            collectors: HashMap::new(),
            call_timeout,
        }
    }

    /// Register a collector for a platform, replacing any existing one.
    pub fn register(&mut self, platform: Platform, collector: Arc<dyn ProfileCollector>) {
        tracing::info!("Registered profile collector for platform '{}'", platform);
        self.collectors.insert(platform, collector);
    }

    /// Whether a collector is registered for the platform.
    pub fn supports(&self, platform: Platform) -> bool {
        self.collectors.contains_key(&platform)
    }

    /// Collect the profile for `(platform, username)` within the timeout.
    pub async fn collect(
        &self,
        platform: Platform,
        username: &str,
    ) -> Result<(ProfileData, Vec<PostData>), CollectionError> {
        let collector = self
            .collectors
            .get(&platform)
            .ok_or(CollectionError::Unsupported(platform))?;

        match timeout(self.call_timeout, collector.fetch_profile(username)).await {
            Ok(result) => result,
            Err(_elapsed) => {
                tracing::warn!(
                    "Profile collection timed out after {:?}: platform='{}', username='{}'",
                    self.call_timeout,
                    platform,
                    username
                );
                Err(CollectionError::Timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct SlowCollector;

    #[async_trait]
    impl ProfileCollector for SlowCollector {
        async fn fetch_profile(
            &self,
            _username: &str,
        ) -> Result<(ProfileData, Vec<PostData>), CollectionError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(CollectionError::UpstreamBlocked)
        }
    }

    #[tokio::test]
    async fn unsupported_platform_without_collector() {
        let registry = CollectorRegistry::new(Duration::from_secs(1));
        let err = registry
            .collect(Platform::Youtube, "someone")
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionError::Unsupported(Platform::Youtube)));
        assert!(!err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_collector_times_out() {
        let mut registry = CollectorRegistry::new(Duration::from_secs(5));
        registry.register(Platform::Instagram, Arc::new(SlowCollector));
        let err = registry
            .collect(Platform::Instagram, "someone")
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionError::Timeout));
        assert!(err.is_retryable());
    }
}
