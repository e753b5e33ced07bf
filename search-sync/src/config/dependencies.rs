//! Dependency initialization and wiring for search sync.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use search_sync_repository::opensearch::IndexConfig;
use search_sync_repository::{DocumentService, DocumentServiceConfig, OpenSearchBackend};

use crate::config::CoordinatorConfig;
use crate::coordinator::ChangeBatchCoordinator;
use crate::errors::SyncError;
use crate::registry::CollectionRegistry;
use crate::transformer::FieldMappingTransformer;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if the cluster is unreachable.
    FailFast,
    /// Retry at a fixed interval until the cluster answers.
    Retry,
}

impl ConnectionMode {
    /// Parse a connection mode name.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Some(Self::FailFast),
            "retry" => Some(Self::Retry),
            _ => None,
        }
    }

    /// Read the mode from `OPENSEARCH_CONNECTION_MODE`, defaulting to retry.
    fn from_env() -> Self {
        match env::var("OPENSEARCH_CONNECTION_MODE") {
            Ok(value) => Self::parse(&value).unwrap_or_else(|| {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }),
            Err(_) => Self::Retry,
        }
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The coordinator, wired to OpenSearch and ready to receive lifecycle events.
    pub coordinator: ChangeBatchCoordinator,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `SEARCH_INDEX_PREFIX`: Prefix prepended to every index name (default: none)
    /// - `SEARCH_SYNC_MAX_BATCH_SIZE`: Documents per import call, "0" for no limit (default: 1000)
    /// - `SEARCH_SYNC_FLUSH_POLICY`: "continue" or "stop-on-error" (default: continue)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(SyncError)` - If initialization fails (only in fail-fast mode)
    pub async fn new(registry: Arc<dyn CollectionRegistry>) -> Result<Self, SyncError> {
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let connection_mode = ConnectionMode::from_env();
        let retry_interval = env::var("OPENSEARCH_RETRY_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS);
        let index_config = match env::var("SEARCH_INDEX_PREFIX") {
            Ok(prefix) if !prefix.is_empty() => IndexConfig::new(prefix),
            _ => IndexConfig::default(),
        };
        let service_config =
            document_service_config(env::var("SEARCH_SYNC_MAX_BATCH_SIZE").ok().as_deref());
        let coordinator_config = CoordinatorConfig::from_env();

        info!(
            opensearch_url = %opensearch_url,
            index_prefix = ?index_config.prefix,
            max_batch_size = ?service_config.max_batch_size,
            flush_policy = ?coordinator_config.flush_policy,
            connection_mode = ?connection_mode,
            retry_interval_secs = retry_interval,
            "Initializing dependencies"
        );

        let backend = Self::connect_to_opensearch(
            &opensearch_url,
            index_config,
            connection_mode,
            Duration::from_secs(retry_interval),
        )
        .await?;

        info!("OpenSearch connection established");

        let service = DocumentService::with_config(Box::new(backend), service_config);
        let transformer = FieldMappingTransformer::new(registry.clone());

        let coordinator = ChangeBatchCoordinator::with_config(
            registry,
            Arc::new(transformer),
            Arc::new(service),
            coordinator_config,
        );

        Ok(Self { coordinator })
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        url: &str,
        index_config: IndexConfig,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchBackend, SyncError> {
        loop {
            match Self::try_connect_opensearch(url, index_config.clone()).await {
                Ok(backend) => return Ok(backend),
                Err(e) => match mode {
                    ConnectionMode::FailFast => return Err(e),
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    /// Build a client and check that the cluster answers.
    async fn try_connect_opensearch(
        url: &str,
        index_config: IndexConfig,
    ) -> Result<OpenSearchBackend, SyncError> {
        let backend = OpenSearchBackend::new(url, index_config)?;
        backend.ping().await?;
        Ok(backend)
    }
}

/// Build the document service config from a raw batch size setting.
fn document_service_config(max_batch_size: Option<&str>) -> DocumentServiceConfig {
    let Some(raw) = max_batch_size else {
        return DocumentServiceConfig::default();
    };

    match raw.trim().parse::<usize>() {
        Ok(0) => DocumentServiceConfig::unlimited(),
        Ok(size) => DocumentServiceConfig::with_max_batch_size(size),
        Err(_) => {
            warn!(value = %raw, "Invalid SEARCH_SYNC_MAX_BATCH_SIZE, using the default");
            DocumentServiceConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_sync_repository::config::DEFAULT_MAX_BATCH_SIZE;

    #[test]
    fn test_connection_mode_parse() {
        assert_eq!(ConnectionMode::parse("fail-fast"), Some(ConnectionMode::FailFast));
        assert_eq!(ConnectionMode::parse("FailFast"), Some(ConnectionMode::FailFast));
        assert_eq!(ConnectionMode::parse("RETRY"), Some(ConnectionMode::Retry));
        assert_eq!(ConnectionMode::parse("sometimes"), None);
    }

    #[test]
    fn test_document_service_config() {
        assert_eq!(
            document_service_config(None).max_batch_size,
            Some(DEFAULT_MAX_BATCH_SIZE)
        );
        assert_eq!(document_service_config(Some("250")).max_batch_size, Some(250));
        assert_eq!(document_service_config(Some("0")).max_batch_size, None);
        assert_eq!(
            document_service_config(Some("lots")).max_batch_size,
            Some(DEFAULT_MAX_BATCH_SIZE)
        );
    }
}
